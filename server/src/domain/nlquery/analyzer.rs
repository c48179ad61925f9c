//! Conversational span and trace analysis
//!
//! Every analysis runs inside a session. A call without a session id starts a
//! new conversation seeded with the matching system prompt; a call with one
//! continues that conversation. The user turn and the model answer are stored
//! together only after the model succeeds.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::NlQueryError;
use super::prompts::{
    SPAN_ANALYSIS_SYSTEM_PROMPT, SPAN_USER_PREFIX, TRACE_ANALYSIS_SYSTEM_PROMPT,
    TRACE_USER_PREFIX,
};
use super::session::{Message, Role, SessionStore};
use crate::data::llm::{ChatMessage, ChatModel, GenerateOptions};

/// Generation settings for analysis calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Model answer and the session it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub session_id: String,
}

pub struct Analyzer {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
    sessions: Arc<SessionStore>,
}

/// Session resolved for one call
struct Conversation {
    id: String,
    history: Vec<Message>,
    created: bool,
}

impl Analyzer {
    pub fn new(
        model: Arc<dyn ChatModel>,
        config: AnalyzerConfig,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            model,
            config,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Explain one rendered span
    pub async fn analyze_span(
        &self,
        span_text: &str,
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Analysis, NlQueryError> {
        let user_turn = format!("{SPAN_USER_PREFIX}{span_text}");
        self.run(SPAN_ANALYSIS_SYSTEM_PROMPT, user_turn, session_id, cancel)
            .await
    }

    /// Explain one rendered trace
    pub async fn analyze_trace(
        &self,
        trace_text: &str,
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Analysis, NlQueryError> {
        let user_turn = format!("{TRACE_USER_PREFIX}{trace_text}");
        self.run(TRACE_ANALYSIS_SYSTEM_PROMPT, user_turn, session_id, cancel)
            .await
    }

    /// Ask a question inside an existing session; never creates one
    pub async fn follow_up(
        &self,
        question: &str,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, NlQueryError> {
        if session_id.is_empty() {
            return Err(NlQueryError::validation(
                "session_id",
                "session_id is required for follow-up questions",
            ));
        }
        let conversation = self.existing(session_id)?;
        let analysis = self
            .complete(conversation, question.to_string(), cancel)
            .await?;
        Ok(analysis.text)
    }

    async fn run(
        &self,
        system_prompt: &str,
        user_turn: String,
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Analysis, NlQueryError> {
        let conversation = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => self.existing(id)?,
            None => self.start(system_prompt),
        };
        self.complete(conversation, user_turn, cancel).await
    }

    fn existing(&self, id: &str) -> Result<Conversation, NlQueryError> {
        let session = self
            .sessions
            .get(id)
            .ok_or(NlQueryError::SessionNotFound)?;
        Ok(Conversation {
            id: session.id,
            history: session.messages,
            created: false,
        })
    }

    fn start(&self, system_prompt: &str) -> Conversation {
        let session = self.sessions.create_with_system(system_prompt);
        Conversation {
            id: session.id,
            history: session.messages,
            created: true,
        }
    }

    async fn complete(
        &self,
        conversation: Conversation,
        user_turn: String,
        cancel: &CancellationToken,
    ) -> Result<Analysis, NlQueryError> {
        let mut messages: Vec<ChatMessage> = conversation
            .history
            .iter()
            .map(|m| match m.role {
                Role::System => ChatMessage::system(m.content.clone()),
                Role::Assistant => ChatMessage::assistant(m.content.clone()),
                Role::User => ChatMessage::user(m.content.clone()),
            })
            .collect();
        messages.push(ChatMessage::user(user_turn.clone()));

        let result = self.generate(&messages, cancel).await;
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                if conversation.created {
                    self.sessions.delete(&conversation.id);
                }
                tracing::debug!(
                    session_id = %conversation.id,
                    error = %e,
                    "Analysis failed"
                );
                return Err(e);
            }
        };

        if !self
            .sessions
            .add_exchange(&conversation.id, user_turn, answer.clone())
        {
            return Err(NlQueryError::SessionNotFound);
        }

        tracing::debug!(
            session_id = %conversation.id,
            model = %self.model.model_name(),
            turns = messages.len(),
            "Analysis completed"
        );

        Ok(Analysis {
            text: answer,
            session_id: conversation.id,
        })
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, NlQueryError> {
        let options = GenerateOptions {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            json_mode: false,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NlQueryError::Cancelled),
            response = self.model.generate(messages, &options) => response?,
        };

        match response.first_content() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(NlQueryError::EmptyResponse),
        }
    }
}
