//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// This is the core abstraction for the semantic-matching oracle. Each
/// completion request is independent - no conversation state is maintained
/// between calls, so every field-match query starts from a clean slate.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

pub mod mock {
    //! Mock LLM client for tests
    //!
    //! Not gated behind cfg(test) so integration tests can drive the
    //! pipeline without a live API.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::debug;

    use super::*;

    /// Scripted client: returns canned responses in order, errors when exhausted
    pub struct MockLlmClient {
        responses: Vec<Result<CompletionResponse, String>>,
        call_count: AtomicUsize,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<CompletionResponse, String>>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Convenience: every response succeeds with the given texts
        pub fn with_texts(texts: Vec<&str>) -> Self {
            Self::new(texts.into_iter().map(|t| Ok(CompletionResponse::text(t))).collect())
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockLlmClient::complete: called");
            match self.responses.get(idx) {
                Some(Ok(resp)) => Ok(resp.clone()),
                Some(Err(msg)) => Err(LlmError::InvalidResponse(msg.clone())),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }
    }

}
