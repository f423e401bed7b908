//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// The workflow never keeps conversation memory: the judge, the finder and
/// the composer each send one prompt and read one answer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Provider/model label used in logs
    fn describe(&self) -> String {
        "llm".to_string()
    }
}
