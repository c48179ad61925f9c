//! Chat model abstraction
//!
//! The extractor and analyzer talk to generative models only through the
//! `ChatModel` trait. `OllamaModel` is the shipped implementation.

mod ollama;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ollama::OllamaModel;

/// Role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-call generation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    /// Output token limit; 0 leaves the provider default
    pub max_tokens: u32,
    /// Ask the provider to constrain output to a JSON object
    pub json_mode: bool,
}

/// One generated candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub content: String,
}

/// Model output; zero choices means the provider produced nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    pub choices: Vec<Choice>,
}

impl GenerateResponse {
    pub fn single(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                content: content.into(),
            }],
        }
    }

    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.content.as_str())
    }
}

/// Error raised by model providers
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    Decode(String),

    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Generative chat model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the conversation
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<GenerateResponse, ModelError>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}
