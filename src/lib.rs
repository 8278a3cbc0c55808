//! Supplement Flow - Streaming chat endpoints for supplement recommendations
//!
//! This crate turns a chat conversation into a simulated token stream via one
//! of three endpoint variants: a relay to an external chat-flow service, a
//! tool-orchestrated supplement advisor, and a file-search product lookup.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
