//! Compact trace rendering for model prompts
//!
//! Backend spans carry far more than a small model can use. Pruning keeps
//! service, operation, duration, status, a bounded set of attributes and
//! event summaries; the `format_*` functions turn the result into plain text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::time::Duration;

use serde::Serialize;

use crate::data::{SpanData, SpanEvent, TraceData};
use crate::utils::time::{format_span_duration, micros_to_datetime};

/// Attributes kept per span or event, lowest keys first
pub const MAX_ATTRIBUTES_PER_SPAN: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrunedEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrunedSpan {
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub service: String,
    pub operation: String,
    pub duration: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub kind: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<PrunedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrunedTrace {
    pub trace_id: String,
    pub span_count: usize,
    pub services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_span: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<String>,
    pub spans: Vec<PrunedSpan>,
}

pub fn prune_span(span: &SpanData) -> PrunedSpan {
    PrunedSpan {
        span_id: span.span_id.clone(),
        parent_span_id: span.parent_span_id.clone().filter(|p| !p.is_empty()),
        service: span.service.clone(),
        operation: span.operation.clone(),
        duration: format_micros(span.duration_us),
        status: span.status.as_str().to_string(),
        status_message: span.status_message.clone().filter(|m| !m.is_empty()),
        kind: span.kind.as_str().to_string(),
        attributes: prune_attributes(&span.attributes),
        events: span.events.iter().map(prune_event).collect(),
    }
}

pub fn prune_trace(trace: &TraceData) -> PrunedTrace {
    let spans: Vec<PrunedSpan> = trace.spans.iter().map(prune_span).collect();
    let services: BTreeSet<&str> = trace.spans.iter().map(|s| s.service.as_str()).collect();

    let root_span = trace
        .spans
        .iter()
        .find(|s| s.is_root())
        .map(|s| s.operation.clone());

    let earliest = trace.spans.iter().map(|s| s.start_time_us).min();
    let latest = trace.spans.iter().map(SpanData::end_time_us).max();
    let total_duration = match (earliest, latest) {
        (Some(start), Some(end)) => Some(format_micros(end - start)),
        _ => None,
    };

    PrunedTrace {
        trace_id: trace.trace_id.clone(),
        span_count: spans.len(),
        services: services.into_iter().map(String::from).collect(),
        root_span,
        total_duration,
        spans,
    }
}

pub fn format_span(span: &PrunedSpan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Span: {}", span.operation);
    let _ = writeln!(out, "  Service: {}", span.service);
    let _ = writeln!(out, "  Duration: {}", span.duration);
    let _ = write!(out, "  Status: {}", span.status);
    if let Some(message) = &span.status_message {
        let _ = write!(out, " ({message})");
    }
    out.push('\n');
    let _ = writeln!(out, "  Kind: {}", span.kind);
    if let Some(parent) = &span.parent_span_id {
        let _ = writeln!(out, "  Parent: {parent}");
    }
    if !span.attributes.is_empty() {
        out.push_str("  Attributes:\n");
        for (key, value) in &span.attributes {
            let _ = writeln!(out, "    {key}: {value}");
        }
    }
    if !span.events.is_empty() {
        out.push_str("  Events:\n");
        for event in &span.events {
            let _ = write!(out, "    - {}", event.name);
            if let Some(time) = &event.time {
                let _ = write!(out, " @ {time}");
            }
            out.push('\n');
            for (key, value) in &event.attributes {
                let _ = writeln!(out, "      {key}: {value}");
            }
        }
    }
    out
}

pub fn format_trace(trace: &PrunedTrace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trace ID: {}", trace.trace_id);
    let _ = writeln!(out, "Total Spans: {}", trace.span_count);
    let _ = writeln!(out, "Services: {}", trace.services.join(", "));
    if let Some(root) = &trace.root_span {
        let _ = writeln!(out, "Root Operation: {root}");
    }
    if let Some(duration) = &trace.total_duration {
        let _ = writeln!(out, "Total Duration: {duration}");
    }
    out.push_str("\n--- Spans ---\n");
    for span in &trace.spans {
        out.push_str(&format_span(span));
        out.push('\n');
    }
    out
}

fn format_micros(micros: i64) -> String {
    format_span_duration(Duration::from_micros(micros.max(0) as u64))
}

fn prune_attributes(attributes: &[(String, String)]) -> BTreeMap<String, String> {
    let all: BTreeMap<String, String> = attributes.iter().cloned().collect();
    all.into_iter().take(MAX_ATTRIBUTES_PER_SPAN).collect()
}

fn prune_event(event: &SpanEvent) -> PrunedEvent {
    let time = (event.timestamp_us > 0).then(|| {
        micros_to_datetime(event.timestamp_us)
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    });
    PrunedEvent {
        name: event.name.clone(),
        time,
        attributes: prune_attributes(&event.attributes),
    }
}
