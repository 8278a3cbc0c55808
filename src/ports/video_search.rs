//! Video Search Port - Interface for finding one educational video per query.
//!
//! Implementations make exactly one attempt per call; retry and backoff live
//! in the `RetryingVideoSearch` wrapper so they can be tested without a
//! network.

use async_trait::async_trait;
use thiserror::Error;

/// Port for the auxiliary video search service.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Returns the single best hit for `query`, or `None` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<VideoHit>, VideoSearchError>;
}

/// A video found by the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHit {
    /// Service-specific video identifier.
    pub video_id: String,
    /// Video title, when the service returned one.
    pub title: Option<String>,
}

impl VideoHit {
    /// Creates a hit.
    pub fn new(video_id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title,
        }
    }

    /// Public watch link for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Video search errors.
#[derive(Debug, Clone, Error)]
pub enum VideoSearchError {
    /// The service answered with an error status.
    #[error("video search returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// The request never produced a response.
    #[error("video search network error: {0}")]
    Network(String),

    /// The response body could not be understood.
    #[error("video search parse error: {0}")]
    Parse(String),

    /// No API key is configured.
    #[error("video search is not configured")]
    NotConfigured,
}

impl VideoSearchError {
    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns true for server errors, rate limiting and network failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            VideoSearchError::Status { status, .. } => *status >= 500 || *status == 429,
            VideoSearchError::Network(_) => true,
            VideoSearchError::Parse(_) | VideoSearchError::NotConfigured => false,
        }
    }
}
