use async_trait::async_trait;
use thiserror::Error;

mod openai;

pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode LLM response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("LLM returned no reply")]
    EmptyReply,
}

/// One chat-completion call: optional system message, user prompt and the
/// sampling temperature to use.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the request and returns the model's text reply unmodified.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
