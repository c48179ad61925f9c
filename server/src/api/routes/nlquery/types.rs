//! Request/response DTOs for the natural-language endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::types::{validate_span_id, validate_trace_id};
use crate::domain::SearchParams;
use crate::domain::nlquery::TraceSearchResult;

#[derive(Debug, Deserialize, Validate)]
pub struct NlQueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct NlQueryResponse {
    pub params: SearchParams,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub params: SearchParams,
    pub traces: Vec<TraceSearchResult>,
}

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub services: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeSpanRequest {
    #[validate(custom(function = "validate_trace_id"))]
    pub trace_id: String,
    #[validate(custom(function = "validate_span_id"))]
    pub span_id: String,
    /// Continue an existing conversation instead of starting one
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeTraceRequest {
    #[validate(custom(function = "validate_trace_id"))]
    pub trace_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FollowUpRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "session_id is required"))]
    pub session_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "question is required"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub session_id: String,
}
