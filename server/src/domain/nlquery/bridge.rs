//! Runs extracted parameters against the trace backend
//!
//! Results use the same summary shape as the trace search tool so callers can
//! treat both interchangeably.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;

use super::error::NlQueryError;
use super::params::SearchParams;
use crate::data::{SpanStatus, TraceData, TraceRepository};
use crate::utils::time::micros_to_datetime;

/// Lookback applied when the query carries no time range
const DEFAULT_SEARCH_WINDOW_HOURS: i64 = 1;

/// Summary of one matching trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceSearchResult {
    pub trace_id: String,
    pub root_service: String,
    pub root_span_name: String,
    /// RFC 3339 with nanoseconds; empty for a trace without spans
    pub start_time: String,
    pub duration_us: i64,
    pub span_count: usize,
    pub service_count: usize,
    pub has_errors: bool,
}

pub struct SearchBridge {
    repository: Arc<dyn TraceRepository>,
}

impl SearchBridge {
    pub fn new(repository: Arc<dyn TraceRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn TraceRepository> {
        &self.repository
    }

    /// Validate the parameters, search the last hour by default and summarize each hit
    pub async fn search_traces(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<TraceSearchResult>, NlQueryError> {
        let mut query = params.to_trace_query().map_err(|e| match e {
            NlQueryError::Validation { field, message } => NlQueryError::Validation {
                field,
                message: format!("invalid search params: {message}"),
            },
            other => other,
        })?;

        let now = Utc::now();
        if query.start_time_min.is_none() {
            query.start_time_min = Some(now - ChronoDuration::hours(DEFAULT_SEARCH_WINDOW_HOURS));
        }
        if query.start_time_max.is_none() {
            query.start_time_max = Some(now);
        }

        let traces = self.repository.find_traces(&query).await?;
        tracing::debug!(
            service = %query.service_name,
            operation = %query.operation_name,
            found = traces.len(),
            "Trace search completed"
        );

        Ok(traces.iter().map(build_trace_search_result).collect())
    }

    pub async fn get_services(&self) -> Result<Vec<String>, NlQueryError> {
        Ok(self.repository.get_services().await?)
    }
}

pub fn build_trace_search_result(trace: &TraceData) -> TraceSearchResult {
    let mut result = TraceSearchResult {
        trace_id: trace.trace_id.clone(),
        span_count: trace.spans.len(),
        ..Default::default()
    };

    let mut services = HashSet::new();
    let mut min_start: Option<i64> = None;
    let mut max_end: Option<i64> = None;

    for span in &trace.spans {
        services.insert(span.service.as_str());

        if span.is_root() && result.root_span_name.is_empty() {
            result.root_service = span.service.clone();
            result.root_span_name = span.operation.clone();
        }

        min_start = Some(min_start.map_or(span.start_time_us, |m| m.min(span.start_time_us)));
        max_end = Some(max_end.map_or(span.end_time_us(), |m| m.max(span.end_time_us())));

        if span.status == SpanStatus::Error {
            result.has_errors = true;
        }
    }

    result.service_count = services.len();
    if let (Some(start), Some(end)) = (min_start, max_end) {
        result.start_time =
            micros_to_datetime(start).to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
        result.duration_us = end.saturating_sub(start);
    }

    result
}
