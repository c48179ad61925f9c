//! Repository trait for trace backends
//!
//! The query and analysis layers depend on this trait only, so tests can
//! substitute an in-memory backend and the Jaeger client can be swapped for
//! another store.

use async_trait::async_trait;

use crate::data::error::TraceBackendError;
use crate::data::types::{TraceData, TraceQuery};

/// Read-only access to stored traces
#[async_trait]
pub trait TraceRepository: Send + Sync {
    /// Get a single trace by hex ID; `None` when the backend has no such trace
    async fn get_trace(&self, trace_id: &str) -> Result<Option<TraceData>, TraceBackendError>;

    /// Find traces matching the query
    async fn find_traces(&self, query: &TraceQuery) -> Result<Vec<TraceData>, TraceBackendError>;

    /// List service names known to the backend
    async fn get_services(&self) -> Result<Vec<String>, TraceBackendError>;
}
