//! Error type for trace backend operations

use thiserror::Error;

/// Error returned by trace backend clients
#[derive(Error, Debug)]
pub enum TraceBackendError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Trace backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Trace backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend reported errors in the response envelope
    #[error("Trace backend error: {0}")]
    Backend(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode trace backend response: {0}")]
    Decode(String),

    /// Client misconfiguration
    #[error("Trace backend configuration error: {0}")]
    Config(String),
}
