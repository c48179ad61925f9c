//! Jaeger query API JSON types

use std::collections::HashMap;

use serde::Deserialize;

use crate::data::types::{SpanData, SpanEvent, SpanKind, SpanStatus, TraceData};

/// Tags folded into dedicated span fields instead of attributes
const RESERVED_TAGS: &[&str] = &[
    "span.kind",
    "otel.status_code",
    "otel.status_description",
    "error",
    "internal.span.format",
];

/// Response envelope used by every query endpoint
#[derive(Debug, Deserialize)]
pub struct JaegerResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<JaegerError>>,
}

#[derive(Debug, Deserialize)]
pub struct JaegerError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct JaegerTrace {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(default)]
    pub spans: Vec<JaegerSpan>,
    #[serde(default)]
    pub processes: HashMap<String, JaegerProcess>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JaegerSpan {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(default)]
    pub operation_name: String,
    #[serde(default)]
    pub references: Vec<JaegerReference>,
    /// Microseconds since Unix epoch
    #[serde(default)]
    pub start_time: i64,
    /// Microseconds
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub tags: Vec<JaegerKeyValue>,
    #[serde(default)]
    pub logs: Vec<JaegerLog>,
    #[serde(rename = "processID", default)]
    pub process_id: String,
    #[serde(default)]
    pub process: Option<JaegerProcess>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JaegerReference {
    pub ref_type: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JaegerKeyValue {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl JaegerKeyValue {
    fn value_string(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JaegerLog {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub fields: Vec<JaegerKeyValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JaegerProcess {
    #[serde(default)]
    pub service_name: String,
}

impl JaegerTrace {
    /// Convert into the backend-neutral model, resolving process references
    pub fn into_trace_data(self) -> TraceData {
        let processes = self.processes;
        let spans = self
            .spans
            .into_iter()
            .map(|span| {
                let service = span
                    .process
                    .as_ref()
                    .or_else(|| processes.get(&span.process_id))
                    .map(|p| p.service_name.clone())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "unknown".to_string());
                span.into_span_data(service)
            })
            .collect();

        TraceData {
            trace_id: self.trace_id,
            spans,
        }
    }
}

impl JaegerSpan {
    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(JaegerKeyValue::value_string)
    }

    fn status(&self) -> SpanStatus {
        match self.tag("otel.status_code").as_deref() {
            Some(code) if code.eq_ignore_ascii_case("error") => SpanStatus::Error,
            Some(code) if code.eq_ignore_ascii_case("ok") => SpanStatus::Ok,
            _ if self.tag("error").as_deref() == Some("true") => SpanStatus::Error,
            _ => SpanStatus::Unset,
        }
    }

    fn parent_span_id(&self) -> Option<String> {
        self.references
            .iter()
            .find(|r| r.ref_type == "CHILD_OF")
            .or_else(|| self.references.first())
            .map(|r| r.span_id.clone())
    }

    fn into_span_data(self, service: String) -> SpanData {
        let status = self.status();
        let status_message = self
            .tag("otel.status_description")
            .filter(|m| !m.is_empty());
        let kind = self
            .tag("span.kind")
            .map(|k| SpanKind::from_tag(&k))
            .unwrap_or_default();
        let parent_span_id = self.parent_span_id();

        let attributes = self
            .tags
            .iter()
            .filter(|t| !RESERVED_TAGS.contains(&t.key.as_str()))
            .map(|t| (t.key.clone(), t.value_string()))
            .collect();

        let events = self
            .logs
            .iter()
            .map(|log| {
                let name = log
                    .fields
                    .iter()
                    .find(|f| f.key == "event")
                    .map(JaegerKeyValue::value_string)
                    .unwrap_or_else(|| "log".to_string());
                let attributes = log
                    .fields
                    .iter()
                    .filter(|f| f.key != "event")
                    .map(|f| (f.key.clone(), f.value_string()))
                    .collect();
                SpanEvent {
                    name,
                    timestamp_us: log.timestamp,
                    attributes,
                }
            })
            .collect();

        SpanData {
            trace_id: self.trace_id,
            span_id: self.span_id,
            parent_span_id,
            service,
            operation: self.operation_name,
            start_time_us: self.start_time,
            duration_us: self.duration,
            status,
            status_message,
            kind,
            attributes,
            events,
        }
    }
}
