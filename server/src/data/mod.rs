//! Data access layer
//!
//! Provides the external collaborators used by the query and analysis domain:
//! - `jaeger` - Trace backend client for the Jaeger HTTP query API
//! - `llm` - Chat model abstraction and the Ollama client
//! - `types` - Backend-neutral trace model
//! - `traits` - Repository trait for trace backends
//! - `error` - Trace backend error type

pub mod error;
pub mod jaeger;
pub mod llm;
pub mod traits;
pub mod types;

pub use error::TraceBackendError;
pub use jaeger::JaegerClient;
pub use traits::TraceRepository;
pub use types::{SpanData, SpanEvent, SpanKind, SpanStatus, TraceData, TraceQuery};
