//! Video Search Adapters.
//!
//! - `YouTubeSearch` - YouTube Data API v3
//! - `RetryingVideoSearch` - bounded exponential backoff around any search
//! - `MockVideoSearch` - scripted outcomes for tests

mod mock;
mod retrying;
mod youtube;

pub use mock::MockVideoSearch;
pub use retrying::{RetryPolicy, RetryingVideoSearch};
pub use youtube::{YouTubeConfig, YouTubeSearch};
