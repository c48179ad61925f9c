//! Shared API types
//!
//! Error responses and validators shared by all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationError;

use crate::data::TraceBackendError;
use crate::domain::{ErrorKind, NlQueryError};
use crate::utils::crypto::is_hex_id;

/// Trace IDs are 16 bytes
pub const TRACE_ID_BYTES: usize = 16;
/// Span IDs are 8 bytes
pub const SPAN_ID_BYTES: usize = 8;

/// Validator function for trace IDs (32 hex characters)
pub fn validate_trace_id(trace_id: &str) -> Result<(), ValidationError> {
    if !is_hex_id(trace_id, TRACE_ID_BYTES) {
        return Err(ValidationError::new("trace_id_format").with_message(
            format!(
                "Invalid trace_id: must be {} hex characters",
                TRACE_ID_BYTES * 2
            )
            .into(),
        ));
    }
    Ok(())
}

/// Validator function for span IDs (16 hex characters)
pub fn validate_span_id(span_id: &str) -> Result<(), ValidationError> {
    if !is_hex_id(span_id, SPAN_ID_BYTES) {
        return Err(ValidationError::new("span_id_format").with_message(
            format!(
                "Invalid span_id: must be {} hex characters",
                SPAN_ID_BYTES * 2
            )
            .into(),
        ));
    }
    Ok(())
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    /// An upstream dependency (model provider, trace backend) failed
    BadGateway { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_gateway(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadGateway {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_nlquery(e: NlQueryError) -> Self {
        if matches!(e, NlQueryError::Cancelled) {
            tracing::debug!("Model call cancelled by shutdown");
            return Self::service_unavailable("server is shutting down");
        }
        match e.kind() {
            ErrorKind::Validation => Self::bad_request("VALIDATION_ERROR", e.to_string()),
            ErrorKind::NotFound => Self::not_found("SESSION_NOT_FOUND", e.to_string()),
            ErrorKind::Provider => {
                tracing::warn!(error = %e, "Model provider error");
                Self::bad_gateway("MODEL_ERROR", e.to_string())
            }
            ErrorKind::Parse => {
                tracing::warn!(error = %e, "Unparseable model output");
                Self::bad_gateway("MODEL_OUTPUT_INVALID", e.to_string())
            }
            ErrorKind::Backend => {
                tracing::error!(error = %e, "Trace backend error");
                Self::bad_gateway("TRACE_BACKEND_ERROR", e.to_string())
            }
        }
    }

    pub fn from_backend(e: TraceBackendError) -> Self {
        tracing::error!(error = %e, "Trace backend error");
        Self::bad_gateway("TRACE_BACKEND_ERROR", "failed to fetch trace")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::BadGateway { code, message } => {
                (StatusCode::BAD_GATEWAY, "bad_gateway", code, message)
            }
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
