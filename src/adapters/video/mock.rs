//! Mock video search for testing.
//!
//! Scripted outcomes are consumed in order; once exhausted every search
//! returns no hit. Outcomes can also be keyed by query so concurrent
//! callers get deterministic answers.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::ports::{VideoHit, VideoSearch, VideoSearchError};

type Outcome = Result<Option<VideoHit>, VideoSearchError>;

/// Mock video search.
#[derive(Debug, Clone, Default)]
pub struct MockVideoSearch {
    queue: Arc<Mutex<VecDeque<Outcome>>>,
    by_query: Arc<Mutex<HashMap<String, VecDeque<Outcome>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockVideoSearch {
    /// Creates a mock with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a hit.
    pub fn with_hit(self, video_id: impl Into<String>, title: Option<String>) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(Ok(Some(VideoHit::new(video_id, title))));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: VideoSearchError) -> Self {
        self.queue.lock().unwrap().push_back(Err(error));
        self
    }

    /// Scripts an outcome for one specific query.
    pub fn on_query(self, query: impl Into<String>, outcome: Outcome) -> Self {
        self.by_query
            .lock()
            .unwrap()
            .entry(query.into())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Returns the number of searches performed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns every query searched, in order.
    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearch for MockVideoSearch {
    async fn search(&self, query: &str) -> Result<Option<VideoHit>, VideoSearchError> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(outcome) = self
            .by_query
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }

        self.queue.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyed_outcomes_take_precedence() {
        let mock = MockVideoSearch::new()
            .with_hit("queued", None)
            .on_query("zinc", Ok(Some(VideoHit::new("keyed", None))));

        let keyed = mock.search("zinc").await.unwrap().unwrap();
        let queued = mock.search("iron").await.unwrap().unwrap();

        assert_eq!(keyed.video_id, "keyed");
        assert_eq!(queued.video_id, "queued");
        assert!(mock.search("iron").await.unwrap().is_none());
        assert_eq!(mock.queries(), vec!["zinc", "iron", "iron"]);
    }
}
