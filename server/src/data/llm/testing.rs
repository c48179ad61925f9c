//! Scripted chat model for tests

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ChatMessage, ChatModel, GenerateOptions, GenerateResponse, ModelError};

/// Returns queued responses in order and records every call
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<GenerateResponse, ModelError>>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, GenerateOptions)>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<GenerateResponse, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Successful single-choice replies
    pub fn replying(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| Ok(GenerateResponse::single(*t)))
                .collect(),
        )
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(ModelError::Status {
            status: 500,
            message: message.to_string(),
        })])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, GenerateOptions)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<GenerateResponse, ModelError> {
        self.calls.lock().push((messages.to_vec(), *options));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Decode("no scripted response left".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
