//! Rule-based extractor (no model)

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use super::error::NlQueryError;
use super::extractor::{Extractor, ExtractorKind};
use super::params::SearchParams;

const STATUS_CODE_TAG: &str = "http.status_code";

static SERVICE_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+([a-z][a-z0-9_-]*(?:-service)?)\b").expect("Invalid regex")
});

static SERVICE_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bin\s+([a-z][a-z0-9_-]*-service)\b").expect("Invalid regex")
});

static HTTP_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:http(?:\s+status)?|status(?:\s+code)?)\s+(\d{3})|(\d{3})\s+errors?)\b",
    )
    .expect("Invalid regex")
});

static MIN_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:more|slower|longer|over)\s+than|taking\s+over|at\s+least|>\s*)\s*(\d+(?:\.\d+)?)\s*(milliseconds|seconds|minutes|hours|ms|s|m|h|us|ns)",
    )
    .expect("Invalid regex")
});

static MAX_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:less|faster|shorter)\s+than|under|within|at\s+most|<\s*)\s*(\d+(?:\.\d+)?)\s*(milliseconds|seconds|minutes|hours|ms|s|m|h|us|ns)",
    )
    .expect("Invalid regex")
});

static OPERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s+(/[/a-zA-Z0-9_{}.*-]+)")
        .expect("Invalid regex")
});

/// Deterministic pattern matcher; same input always gives the same output
#[derive(Debug, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_sync(&self, text: &str) -> SearchParams {
        let mut params = SearchParams {
            service: extract_service(text),
            operation: extract_operation(text),
            min_duration: extract_duration(text, &MIN_DURATION),
            max_duration: extract_duration(text, &MAX_DURATION),
            ..Default::default()
        };
        if let Some(code) = extract_status_code(text) {
            params.tags.insert(STATUS_CODE_TAG.to_string(), code);
        }
        params
    }
}

#[async_trait]
impl Extractor for HeuristicExtractor {
    async fn extract(
        &self,
        text: &str,
        _cancel: &CancellationToken,
    ) -> Result<SearchParams, NlQueryError> {
        Ok(self.extract_sync(text))
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Heuristic
    }
}

fn extract_service(text: &str) -> String {
    SERVICE_FROM
        .captures(text)
        .or_else(|| SERVICE_IN.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn extract_operation(text: &str) -> String {
    OPERATION
        .captures(text)
        .map(|c| format!("{} {}", &c[1], &c[2]))
        .unwrap_or_default()
}

fn extract_status_code(text: &str) -> Option<String> {
    let caps = HTTP_STATUS.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn extract_duration(text: &str, pattern: &Regex) -> String {
    pattern
        .captures(text)
        .map(|c| format!("{}{}", &c[1], normalize_unit(&c[2])))
        .unwrap_or_default()
}

fn normalize_unit(unit: &str) -> String {
    let unit = unit.to_lowercase();
    match unit.as_str() {
        "milliseconds" => "ms".to_string(),
        "seconds" => "s".to_string(),
        "minutes" => "m".to_string(),
        "hours" => "h".to_string(),
        _ => unit,
    }
}
