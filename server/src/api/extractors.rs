//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::core::constants::SESSION_ID_BYTES;
use crate::utils::crypto::is_hex_id;

/// Raw path extractor for session routes (internal use)
#[derive(Debug, Deserialize)]
struct SessionPathRaw {
    session_id: String,
}

/// Validated session path extractor.
///
/// Extracts `session_id` from URL path parameters and checks it has the
/// shape of an issued session ID. Returns a 400 Bad Request otherwise.
#[derive(Debug)]
pub struct SessionPath {
    pub session_id: String,
}

/// Session IDs are lowercase hex tokens of `SESSION_ID_BYTES` bytes
pub fn is_valid_session_id(id: &str) -> bool {
    is_hex_id(id, SESSION_ID_BYTES)
}

impl<S> FromRequestParts<S> for SessionPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<SessionPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_session_id(&raw.session_id) {
            return Err(ValidationRejection::InvalidSessionId);
        }

        Ok(Self {
            session_id: raw.session_id,
        })
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Invalid session_id format
    InvalidSessionId,
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidSessionId => (
                StatusCode::BAD_REQUEST,
                "INVALID_SESSION_ID",
                format!(
                    "Invalid session_id: must be {} hex characters",
                    SESSION_ID_BYTES * 2
                ),
            ),
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                "JSON_PARSE_ERROR",
                format!("invalid request body: {}", rejection.body_text()),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Join field messages, ordered by field name so responses are stable
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "question is required"))]
        question: String,
        #[validate(length(min = 1, message = "session_id is required"))]
        session_id: String,
    }

    #[test]
    fn test_is_valid_session_id() {
        assert!(is_valid_session_id("0123456789abcdef0123456789abcdef"));
        assert!(!is_valid_session_id("0123456789abcdef"));
        assert!(!is_valid_session_id("not-a-session-id-not-a-session!!"));
        assert!(!is_valid_session_id(""));
    }

    #[test]
    fn test_format_validation_errors_sorted_by_field() {
        let sample = Sample {
            question: String::new(),
            session_id: String::new(),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(
            format_validation_errors(&errors),
            "question is required; session_id is required"
        );
    }
}
