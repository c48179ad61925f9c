//! Parameter extraction and search handlers

use axum::Json;
use axum::extract::State;

use super::NlQueryApiState;
use super::types::{NlQueryRequest, NlQueryResponse, SearchResponse, ServicesResponse};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::domain::SearchParams;

async fn extract(state: &NlQueryApiState, query: &str) -> Result<SearchParams, ApiError> {
    if query.is_empty() {
        return Err(ApiError::bad_request(
            "QUERY_REQUIRED",
            "query field is required",
        ));
    }
    let cancel = state.cancel.child_token();
    state
        .nlquery
        .extractor
        .extract(query, &cancel)
        .await
        .map_err(|e| {
            tracing::debug!(query = %query, error = %e, "Extraction failed");
            ApiError::from_nlquery(e)
        })
}

/// Turn free text into search parameters
pub async fn extract_params(
    State(state): State<NlQueryApiState>,
    ValidatedJson(req): ValidatedJson<NlQueryRequest>,
) -> Result<Json<NlQueryResponse>, ApiError> {
    let params = extract(&state, &req.query).await?;
    Ok(Json(NlQueryResponse { params }))
}

/// Extract parameters, then run them against the trace backend
pub async fn search(
    State(state): State<NlQueryApiState>,
    ValidatedJson(req): ValidatedJson<NlQueryRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let params = extract(&state, &req.query).await?;
    let traces = state
        .bridge
        .search_traces(&params)
        .await
        .map_err(ApiError::from_nlquery)?;
    Ok(Json(SearchResponse { params, traces }))
}

pub async fn services(
    State(state): State<NlQueryApiState>,
) -> Result<Json<ServicesResponse>, ApiError> {
    let services = state
        .bridge
        .get_services()
        .await
        .map_err(ApiError::from_nlquery)?;
    Ok(Json(ServicesResponse { services }))
}
