//! Span, trace and follow-up analysis handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::NlQueryApiState;
use super::types::{AnalysisResponse, AnalyzeSpanRequest, AnalyzeTraceRequest, FollowUpRequest};
use crate::api::extractors::{SessionPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::TraceData;
use crate::domain::nlquery::{Analysis, format_span, format_trace, prune_span, prune_trace};

/// Fetch a trace; absent or empty traces are 404
async fn fetch_trace(state: &NlQueryApiState, trace_id: &str) -> Result<TraceData, ApiError> {
    let trace = state
        .bridge
        .repository()
        .get_trace(&trace_id.to_ascii_lowercase())
        .await
        .map_err(ApiError::from_backend)?;

    match trace {
        Some(trace) if !trace.spans.is_empty() => Ok(trace),
        _ => Err(ApiError::not_found("TRACE_NOT_FOUND", "trace not found")),
    }
}

fn respond(analysis: Analysis) -> Json<AnalysisResponse> {
    Json(AnalysisResponse {
        analysis: analysis.text,
        session_id: analysis.session_id,
    })
}

/// Explain a single span of a trace
pub async fn analyze_span(
    State(state): State<NlQueryApiState>,
    ValidatedJson(req): ValidatedJson<AnalyzeSpanRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let analyzer = state.analyzer()?;
    let trace = fetch_trace(&state, &req.trace_id).await?;
    let span = trace
        .find_span(&req.span_id)
        .ok_or_else(|| ApiError::not_found("SPAN_NOT_FOUND", "span not found in trace"))?;

    let text = format_span(&prune_span(span));
    let cancel = state.cancel.child_token();
    let analysis = analyzer
        .analyze_span(&text, req.session_id.as_deref(), &cancel)
        .await
        .map_err(ApiError::from_nlquery)?;

    tracing::debug!(
        trace_id = %req.trace_id,
        span_id = %req.span_id,
        session_id = %analysis.session_id,
        "Span analyzed"
    );
    Ok(respond(analysis))
}

/// Explain a whole trace
pub async fn analyze_trace(
    State(state): State<NlQueryApiState>,
    ValidatedJson(req): ValidatedJson<AnalyzeTraceRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let analyzer = state.analyzer()?;
    let trace = fetch_trace(&state, &req.trace_id).await?;

    let text = format_trace(&prune_trace(&trace));
    let cancel = state.cancel.child_token();
    let analysis = analyzer
        .analyze_trace(&text, req.session_id.as_deref(), &cancel)
        .await
        .map_err(ApiError::from_nlquery)?;

    tracing::debug!(
        trace_id = %req.trace_id,
        spans = trace.spans.len(),
        session_id = %analysis.session_id,
        "Trace analyzed"
    );
    Ok(respond(analysis))
}

/// Ask a question in an existing analysis session
pub async fn follow_up(
    State(state): State<NlQueryApiState>,
    ValidatedJson(req): ValidatedJson<FollowUpRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let analyzer = state.analyzer()?;
    let cancel = state.cancel.child_token();
    let text = analyzer
        .follow_up(&req.question, &req.session_id, &cancel)
        .await
        .map_err(ApiError::from_nlquery)?;

    Ok(Json(AnalysisResponse {
        analysis: text,
        session_id: req.session_id,
    }))
}

/// Drop a session; unknown or expired IDs are not an error
pub async fn delete_session(
    State(state): State<NlQueryApiState>,
    path: SessionPath,
) -> StatusCode {
    state.nlquery.sessions.delete(&path.session_id);
    tracing::debug!(session_id = %path.session_id, "Session deleted");
    StatusCode::NO_CONTENT
}
