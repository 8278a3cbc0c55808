//! Simulated token streaming over an already-complete answer.
//!
//! Endpoints compute their whole answer first and then replay it as a
//! sequence of [`StreamEvent`]s so chat hosts can render it incrementally.
//!
//! # Contract
//!
//! - Every stream is non-empty and finite.
//! - Token ids start at 0 and increase by one per event.
//! - Exactly one event has `special = true`, and it is the last one. Its
//!   `generated_text` is the concatenation of every earlier token's text.
//! - All earlier events carry `generated_text = None`.
//!
//! # Chunking
//!
//! The answer is split on whitespace runs with the separators kept as pieces
//! of their own, so reassembly is byte-exact. Consecutive pieces are grouped
//! into chunks of `chunk_size`, and the stream sleeps between emissions.

use futures::stream::{self, Stream};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Boxed stream of events returned by every endpoint.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// One increment of output text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: u32,
    pub text: String,
    pub logprob: f64,
    pub special: bool,
}

/// A single event in an endpoint's output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub token: Token,
    /// Full answer, present only on the terminal event.
    pub generated_text: Option<String>,
    /// Always null; kept for wire compatibility.
    pub details: Option<serde_json::Value>,
}

impl StreamEvent {
    /// Creates a non-terminal chunk event.
    pub fn chunk(id: u32, text: impl Into<String>) -> Self {
        Self {
            token: Token {
                id,
                text: text.into(),
                logprob: 0.0,
                special: false,
            },
            generated_text: None,
            details: None,
        }
    }

    /// Creates the terminal event carrying the full answer.
    pub fn terminal(id: u32, generated_text: impl Into<String>) -> Self {
        Self {
            token: Token {
                id,
                text: String::new(),
                logprob: 0.0,
                special: true,
            },
            generated_text: Some(generated_text.into()),
            details: None,
        }
    }

    /// Returns true if this is the end-of-answer event.
    pub fn is_terminal(&self) -> bool {
        self.token.special
    }
}

/// Chunk size and pacing for a simulated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    /// Pieces per emitted chunk (at least 1).
    pub chunk_size: usize,
    /// Pause after a prose chunk.
    pub delay: Duration,
    /// Pause after a chunk containing a double quote (JSON streams faster).
    pub quoted_delay: Duration,
}

impl ChunkingOptions {
    /// Creates options with an explicit chunk size and a single delay.
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            delay,
            quoted_delay: delay,
        }
    }

    /// One piece per event at 10 ms, as the plain relay streams.
    pub fn word_by_word() -> Self {
        Self::new(1, Duration::from_millis(10))
    }

    /// Eight pieces per event, 10 ms for prose and 3 ms for JSON.
    pub fn json_friendly() -> Self {
        Self::new(8, Duration::from_millis(10)).with_quoted_delay(Duration::from_millis(3))
    }

    /// No pauses at all.
    pub fn immediate(chunk_size: usize) -> Self {
        Self::new(chunk_size, Duration::ZERO)
    }

    /// Sets the pause used after chunks containing `"`.
    pub fn with_quoted_delay(mut self, delay: Duration) -> Self {
        self.quoted_delay = delay;
        self
    }

    /// Returns the pause to take after emitting `chunk`.
    pub fn delay_after(&self, chunk: &str) -> Duration {
        if chunk.contains('"') {
            self.quoted_delay
        } else {
            self.delay
        }
    }
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self::json_friendly()
    }
}

/// Splits `text` on whitespace runs, keeping each run as its own piece.
///
/// Empty pieces are never produced, so an empty input yields no pieces and
/// `pieces.concat() == text` always holds.
pub fn split_preserving_whitespace(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for run in WHITESPACE.find_iter(text) {
        if run.start() > last {
            pieces.push(&text[last..run.start()]);
        }
        pieces.push(run.as_str());
        last = run.end();
    }

    if last < text.len() {
        pieces.push(&text[last..]);
    }

    pieces
}

/// Groups the whitespace-preserving pieces of `text` into chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    split_preserving_whitespace(text)
        .chunks(chunk_size.max(1))
        .map(|group| group.concat())
        .collect()
}

struct StreamState {
    chunks: std::vec::IntoIter<String>,
    next_id: u32,
    generated: String,
    pending_delay: Duration,
    finished: bool,
}

/// Replays a complete answer as a lazy event stream.
///
/// The stream sleeps before every event except the first, using the delay
/// chosen for the previously emitted chunk.
pub fn stream_text(text: impl Into<String>, options: ChunkingOptions) -> EventStream {
    let text = text.into();
    let state = StreamState {
        chunks: chunk_text(&text, options.chunk_size).into_iter(),
        next_id: 0,
        generated: String::with_capacity(text.len()),
        pending_delay: Duration::ZERO,
        finished: false,
    };

    Box::pin(stream::unfold(state, move |mut state| async move {
        if state.finished {
            return None;
        }

        if !state.pending_delay.is_zero() {
            sleep(state.pending_delay).await;
        }

        let id = state.next_id;
        state.next_id += 1;

        match state.chunks.next() {
            Some(chunk) => {
                state.generated.push_str(&chunk);
                state.pending_delay = options.delay_after(&chunk);
                Some((StreamEvent::chunk(id, chunk), state))
            }
            None => {
                state.finished = true;
                let full = std::mem::take(&mut state.generated);
                Some((StreamEvent::terminal(id, full), state))
            }
        }
    }))
}
