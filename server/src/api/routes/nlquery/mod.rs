//! Natural-language trace query and analysis endpoints
//!
//! Mounted under `/api/nlquery` only when the feature is enabled.

mod analysis;
mod query;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tokio_util::sync::CancellationToken;

use crate::api::types::ApiError;
use crate::domain::nlquery::{Analyzer, NlQueryComponents, SearchBridge};

#[derive(Clone)]
pub struct NlQueryApiState {
    pub nlquery: Arc<NlQueryComponents>,
    pub bridge: Arc<SearchBridge>,
    /// Cancelled on server shutdown; each model call runs on a child token
    pub cancel: CancellationToken,
}

impl NlQueryApiState {
    /// Analyzer, or 503 when no model provider is configured
    fn analyzer(&self) -> Result<&Arc<Analyzer>, ApiError> {
        self.nlquery.analyzer.as_ref().ok_or_else(|| {
            ApiError::service_unavailable("analysis requires a configured model provider")
        })
    }
}

pub fn routes(state: NlQueryApiState) -> Router<()> {
    Router::new()
        .route("/", post(query::extract_params))
        .route("/search", post(query::search))
        .route("/services", get(query::services))
        .route("/analyze/span", post(analysis::analyze_span))
        .route("/analyze/trace", post(analysis::analyze_trace))
        .route("/analyze/followup", post(analysis::follow_up))
        .route("/sessions/{session_id}", delete(analysis::delete_session))
        .with_state(state)
}
