//! Language-model agents
//!
//! Each agent owns its prompt, its model client and its fault policy:
//! - SuitabilityJudge falls back to a configured verdict on any fault
//! - AlternativeFinder falls back to an empty list on any fault
//! - ItineraryComposer propagates faults

mod composer;
mod finder;
mod judge;
pub mod normalize;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionRequest, LlmClient, LlmError, StopReason};
use crate::prompts::PromptLoader;

pub use composer::ItineraryComposer;
pub use finder::AlternativeFinder;
pub use judge::SuitabilityJudge;
pub use normalize::strip_code_fences;

/// Errors from a single agent call
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Malformed model output: {0}")]
    Malformed(String),

    #[error("Model output was cut off at the {0}-token limit")]
    Truncated(u32),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

impl AgentError {
    /// The model answered, but not in the expected shape
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Truncated(_))
    }

    /// Asking again later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_transient(),
            Self::Timeout(_) | Self::EmptyResponse => true,
            Self::Malformed(_) | Self::Truncated(_) | Self::Prompt(_) => false,
        }
    }
}

/// A value produced by an agent plus a note when a fallback was taken
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome<T> {
    pub value: T,
    pub diagnostic: Option<String>,
}

impl<T> AgentOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            diagnostic: None,
        }
    }

    pub fn recovered(value: T, diagnostic: impl Into<String>) -> Self {
        Self {
            value,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Model call parameters shared by every agent
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tokens: 8192,
            temperature: Some(0.3),
            timeout: Duration::from_secs(90),
        }
    }
}

/// Model client, prompts and settings, shared by the agents
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Arc<dyn LlmClient>,
    pub prompts: Arc<PromptLoader>,
    pub settings: AgentSettings,
}

impl AgentContext {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, settings: AgentSettings) -> Self {
        Self { llm, prompts, settings }
    }

    /// Render `template` and send it as a single-turn request
    ///
    /// Returns the raw text of the response; an empty or whitespace-only
    /// response, or one cut off by the token limit, is an error.
    pub(crate) async fn ask<T: serde::Serialize>(
        &self,
        template: &str,
        context: &T,
        temperature: Option<f32>,
    ) -> Result<String, AgentError> {
        debug!(%template, llm = %self.llm.describe(), "ask: called");
        let prompt = self
            .prompts
            .render(template, context)
            .map_err(|e| AgentError::Prompt(e.to_string()))?;

        let max_tokens = self.settings.max_tokens;
        let mut request = CompletionRequest::prompt(prompt, max_tokens);
        if let Some(t) = temperature {
            request = request.with_temperature(t);
        }

        let timeout = self.settings.timeout;
        let response = tokio::time::timeout(timeout, self.llm.complete(request))
            .await
            .map_err(|_| AgentError::Timeout(timeout))??;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "ask: response received"
        );
        if response.stop_reason == StopReason::MaxTokens {
            return Err(AgentError::Truncated(max_tokens));
        }
        response
            .non_empty_content()
            .map(str::to_string)
            .ok_or(AgentError::EmptyResponse)
    }
}
