//! In-memory submission client for tests and dry runs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::client::{IssueReceipt, SubmissionClient};
use super::error::SubmissionError;
use crate::report::packager::SubmissionPayload;

/// Mock implementation for testing
///
/// Replies are taken from a queue of scripted outcomes; once the queue is
/// empty every call succeeds with a sequential id. Every payload received is
/// recorded for inspection.
#[derive(Clone, Default)]
pub struct MockSubmissionClient {
    outcomes: Arc<Mutex<VecDeque<Result<IssueReceipt, SubmissionError>>>>,
    /// Payloads received, in call order
    pub received: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl MockSubmissionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next call
    pub fn push_outcome(&self, outcome: Result<IssueReceipt, SubmissionError>) {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).push_back(outcome);
    }

    pub fn with_outcome(self, outcome: Result<IssueReceipt, SubmissionError>) -> Self {
        self.push_outcome(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn last_payload(&self) -> Option<SubmissionPayload> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

#[async_trait]
impl SubmissionClient for MockSubmissionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, payload: SubmissionPayload) -> Result<IssueReceipt, SubmissionError> {
        let call = {
            let mut received = self.received.lock().unwrap_or_else(PoisonError::into_inner);
            received.push(payload);
            received.len()
        };

        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(IssueReceipt::new(format!("mock-{}", call))))
    }
}
