//! Error type for extraction and analysis

use thiserror::Error;

use crate::data::TraceBackendError;
use crate::data::llm::ModelError;

/// Coarse classification used by callers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Provider,
    Parse,
    Backend,
}

#[derive(Error, Debug)]
pub enum NlQueryError {
    /// Malformed input or missing required field
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("session not found or expired")]
    SessionNotFound,

    #[error("model generation failed: {0}")]
    Provider(#[from] ModelError),

    #[error("model generation failed: model returned empty response")]
    EmptyResponse,

    #[error("model generation cancelled")]
    Cancelled,

    /// Model output did not match the parameter schema
    #[error("invalid structured output: {message} (raw: {raw:?})")]
    Parse { message: String, raw: String },

    #[error("trace search failed: {0}")]
    Backend(#[from] TraceBackendError),
}

impl NlQueryError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::SessionNotFound => ErrorKind::NotFound,
            Self::Provider(_) | Self::EmptyResponse | Self::Cancelled => ErrorKind::Provider,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_stage() {
        assert_eq!(
            NlQueryError::SessionNotFound.to_string(),
            "session not found or expired"
        );
        assert_eq!(
            NlQueryError::EmptyResponse.to_string(),
            "model generation failed: model returned empty response"
        );

        let err = NlQueryError::Parse {
            message: "expected value at line 1 column 1".to_string(),
            raw: "not json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid structured output: expected value at line 1 column 1 (raw: \"not json\")"
        );

        let err = NlQueryError::from(ModelError::Decode("bad".to_string()));
        assert!(err.to_string().starts_with("model generation failed"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            NlQueryError::validation("minDuration", "invalid minDuration").kind(),
            ErrorKind::Validation
        );
        assert_eq!(NlQueryError::SessionNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(NlQueryError::EmptyResponse.kind(), ErrorKind::Provider);
        assert_eq!(NlQueryError::Cancelled.kind(), ErrorKind::Provider);
        assert_eq!(
            NlQueryError::Parse {
                message: String::new(),
                raw: String::new()
            }
            .kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            NlQueryError::Backend(TraceBackendError::Backend("x".to_string())).kind(),
            ErrorKind::Backend
        );
    }
}
