//! Extractor trait, stub variant and factory

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::error::NlQueryError;
use super::heuristic::HeuristicExtractor;
use super::llm_extractor::LlmExtractor;
use super::params::SearchParams;
use crate::data::llm::{ChatModel, GenerateOptions};

/// Converts free text into restricted search parameters
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Model-backed variants stop and return `Cancelled` once `cancel` fires
    async fn extract(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchParams, NlQueryError>;

    fn kind(&self) -> ExtractorKind;
}

/// Extractor variant selected at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Stub,
    #[default]
    Heuristic,
    Llm,
}

impl ExtractorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::Stub => "stub",
            ExtractorKind::Heuristic => "heuristic",
            ExtractorKind::Llm => "llm",
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stub" => Ok(ExtractorKind::Stub),
            "heuristic" => Ok(ExtractorKind::Heuristic),
            "llm" => Ok(ExtractorKind::Llm),
            _ => Err(format!(
                "Invalid extractor '{}'. Valid options: stub, heuristic, llm",
                s
            )),
        }
    }
}

/// Always returns empty parameters
#[derive(Debug, Default)]
pub struct StubExtractor;

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(
        &self,
        _text: &str,
        _cancel: &CancellationToken,
    ) -> Result<SearchParams, NlQueryError> {
        Ok(SearchParams::default())
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Stub
    }
}

/// Build the extractor for `kind`.
///
/// `Llm` requires a model; the other variants ignore it.
pub fn build_extractor(
    kind: ExtractorKind,
    model: Option<Arc<dyn ChatModel>>,
    options: GenerateOptions,
) -> Result<Arc<dyn Extractor>, NlQueryError> {
    let extractor: Arc<dyn Extractor> = match kind {
        ExtractorKind::Stub => Arc::new(StubExtractor),
        ExtractorKind::Heuristic => Arc::new(HeuristicExtractor::new()),
        ExtractorKind::Llm => {
            let model = model.ok_or_else(|| {
                NlQueryError::validation("provider", "llm extractor requires a model provider")
            })?;
            Arc::new(LlmExtractor::new(model, options))
        }
    };
    tracing::debug!(extractor = %kind, "Extractor built");
    Ok(extractor)
}
