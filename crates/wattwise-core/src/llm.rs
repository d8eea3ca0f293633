//! Abstract LLM runtime backend.
//!
//! The proposal planner talks to an external reasoning service through this
//! trait so that concrete backends (Ollama, cloud APIs, mocks in tests) are
//! interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LLM backend identifier.
///
/// Dynamic string identifier rather than an enum, so backends can be
/// registered at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendId(String);

impl BackendId {
    /// Create a new backend ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub const OLLAMA: &'static str = "ollama";
    pub const MOCK: &'static str = "mock";
}

impl AsRef<str> for BackendId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// LLM backend errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-level failure reaching the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded its deadline.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with something unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend-reported failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Generation parameters.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<usize>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(4096),
        }
    }
}

/// LLM input.
#[derive(Debug, Clone)]
pub struct LlmInput {
    /// Messages for the conversation.
    pub messages: Vec<Message>,
    /// Generation parameters.
    pub params: GenerationParams,
    /// Model identifier (backend-specific).
    pub model: Option<String>,
}

impl LlmInput {
    /// Create a new input with a single user message.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            params: GenerationParams::default(),
            model: None,
        }
    }

    /// Add a message to the conversation.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Finish reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Model stopped naturally.
    Stop,
    /// Max tokens reached.
    Length,
    /// Model hit an error.
    Error,
}

/// LLM output.
#[derive(Debug, Clone)]
pub struct LlmOutput {
    /// Generated text content.
    pub text: String,
    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Abstract LLM runtime.
#[async_trait]
pub trait LlmRuntime: Send + Sync {
    /// Get the backend type identifier.
    fn backend_id(&self) -> BackendId;

    /// Get the current model name.
    fn model_name(&self) -> &str;

    /// Check if the backend is available.
    async fn is_available(&self) -> bool {
        true
    }

    /// Generate a response (non-streaming).
    async fn generate(&self, input: LlmInput) -> Result<LlmOutput, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_builder() {
        let input = LlmInput::new("hello")
            .with_message(Message::assistant("hi"))
            .with_model("test-model");
        assert_eq!(input.messages.len(), 2);
        assert_eq!(input.messages[0].role, MessageRole::User);
        assert_eq!(input.model.as_deref(), Some("test-model"));
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&MessageRole::System).unwrap();
        assert_eq!(json, "\"system\"");
    }
}
