//! Backend-neutral trace model
//!
//! Trace backends decode their wire formats into these types; the pruner
//! and the search bridge only ever see this model.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

// ============================================================================
// Span enums
// ============================================================================

/// Span status code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Unset => "UNSET",
            SpanStatus::Ok => "OK",
            SpanStatus::Error => "ERROR",
        }
    }
}

/// Span kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanKind {
    #[default]
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Unspecified => "UNSPECIFIED",
            SpanKind::Internal => "INTERNAL",
            SpanKind::Server => "SERVER",
            SpanKind::Client => "CLIENT",
            SpanKind::Producer => "PRODUCER",
            SpanKind::Consumer => "CONSUMER",
        }
    }

    /// Parse the `span.kind` tag value (case-insensitive)
    pub fn from_tag(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "internal" => SpanKind::Internal,
            "server" => SpanKind::Server,
            "client" => SpanKind::Client,
            "producer" => SpanKind::Producer,
            "consumer" => SpanKind::Consumer,
            _ => SpanKind::Unspecified,
        }
    }
}

// ============================================================================
// Trace and span data
// ============================================================================

/// Timestamped event attached to a span
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    /// Microseconds since Unix epoch (0 when unknown)
    pub timestamp_us: i64,
    pub attributes: Vec<(String, String)>,
}

/// Single span with attributes already stringified
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanData {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub service: String,
    pub operation: String,
    /// Microseconds since Unix epoch
    pub start_time_us: i64,
    pub duration_us: i64,
    pub status: SpanStatus,
    pub status_message: Option<String>,
    pub kind: SpanKind,
    pub attributes: Vec<(String, String)>,
    pub events: Vec<SpanEvent>,
}

impl SpanData {
    pub fn end_time_us(&self) -> i64 {
        self.start_time_us.saturating_add(self.duration_us)
    }

    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

/// All spans of one trace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceData {
    pub trace_id: String,
    pub spans: Vec<SpanData>,
}

impl TraceData {
    /// Find a span by its hex id (case-insensitive)
    pub fn find_span(&self, span_id: &str) -> Option<&SpanData> {
        self.spans
            .iter()
            .find(|s| s.span_id.eq_ignore_ascii_case(span_id))
    }
}

// ============================================================================
// Query
// ============================================================================

/// Trace search query understood by every backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceQuery {
    pub service_name: String,
    pub operation_name: String,
    pub attributes: BTreeMap<String, String>,
    pub duration_min: Option<Duration>,
    pub duration_max: Option<Duration>,
    /// Maximum number of traces; 0 lets the backend decide
    pub search_depth: u32,
    pub start_time_min: Option<DateTime<Utc>>,
    pub start_time_max: Option<DateTime<Utc>>,
}
