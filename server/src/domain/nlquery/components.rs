//! Wiring of extractor, analyzer and session store from configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use super::analyzer::{Analyzer, AnalyzerConfig};
use super::extractor::{Extractor, ExtractorKind, build_extractor};
use super::session::SessionStore;
use crate::core::config::{NlQueryConfig, SessionsConfig};
use crate::core::constants::{DEFAULT_MODEL_TIMEOUT_SECS, PROVIDER_OLLAMA};
use crate::data::llm::{ChatModel, ModelError, OllamaModel};

/// Everything the natural-language endpoints need
pub struct NlQueryComponents {
    pub extractor: Arc<dyn Extractor>,
    /// Present only when a model provider is configured
    pub analyzer: Option<Arc<Analyzer>>,
    pub sessions: Arc<SessionStore>,
}

impl NlQueryComponents {
    /// Build the components, or `None` when the feature is disabled.
    ///
    /// The extractor and analyzer share one model handle. If anything after
    /// the session store fails to build, the store is closed before the error
    /// is returned.
    pub async fn from_config(
        config: &NlQueryConfig,
        sessions: &SessionsConfig,
    ) -> Result<Option<Self>> {
        if !config.enabled {
            tracing::debug!("Natural-language query disabled");
            return Ok(None);
        }

        let store = Arc::new(SessionStore::new(sessions.session_config()));

        match Self::build(config, store.clone()) {
            Ok(components) => {
                tracing::debug!(
                    extractor = %components.extractor.kind(),
                    analysis = components.analyzer.is_some(),
                    "Natural-language query components ready"
                );
                Ok(Some(components))
            }
            Err(e) => {
                store.close().await;
                Err(e)
            }
        }
    }

    fn build(config: &NlQueryConfig, sessions: Arc<SessionStore>) -> Result<Self> {
        let model = build_model(config).context("Failed to create chat model")?;

        let extractor = build_extractor(
            config.extractor,
            model.clone(),
            config.extraction_options(),
        )
        .context("Failed to create extractor")?;

        let analyzer = model.map(|model| {
            Arc::new(Analyzer::new(
                model,
                AnalyzerConfig {
                    temperature: config.temperature,
                    max_tokens: config.analysis_max_tokens(),
                },
                sessions.clone(),
            ))
        });

        Ok(Self {
            extractor,
            analyzer,
            sessions,
        })
    }

    pub fn extractor_kind(&self) -> ExtractorKind {
        self.extractor.kind()
    }

    /// Stop the session sweep task; safe to call more than once
    pub async fn shutdown(&self) {
        self.sessions.close().await;
    }
}

fn build_model(config: &NlQueryConfig) -> Result<Option<Arc<dyn ChatModel>>, ModelError> {
    match config.provider.as_deref() {
        None => Ok(None),
        Some(PROVIDER_OLLAMA) => {
            let model = OllamaModel::new(
                &config.endpoint,
                &config.model,
                Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            )?;
            tracing::info!(
                provider = PROVIDER_OLLAMA,
                endpoint = %config.endpoint,
                model = %config.model,
                "Chat model configured"
            );
            Ok(Some(Arc::new(model)))
        }
        Some(other) => Err(ModelError::Config(format!(
            "unsupported provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nlquery_config() -> NlQueryConfig {
        NlQueryConfig {
            enabled: true,
            provider: None,
            endpoint: String::new(),
            model: String::new(),
            temperature: 0.0,
            max_tokens: 256,
            extractor: ExtractorKind::Heuristic,
        }
    }

    fn sessions_config() -> SessionsConfig {
        SessionsConfig {
            ttl_secs: 60,
            max_messages: 10,
            sweep_interval_secs: 60,
        }
    }

    #[tokio::test]
    async fn test_disabled_builds_nothing() {
        let config = NlQueryConfig {
            enabled: false,
            ..nlquery_config()
        };
        let components = NlQueryComponents::from_config(&config, &sessions_config())
            .await
            .unwrap();
        assert!(components.is_none());
    }

    #[tokio::test]
    async fn test_without_provider_has_no_analyzer() {
        let components = NlQueryComponents::from_config(&nlquery_config(), &sessions_config())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(components.extractor_kind(), ExtractorKind::Heuristic);
        assert!(components.analyzer.is_none());
        assert_eq!(components.sessions.config().max_messages, 10);
        components.shutdown().await;
    }

    #[tokio::test]
    async fn test_ollama_provider_builds_analyzer() {
        let config = NlQueryConfig {
            provider: Some("ollama".to_string()),
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:1.5b".to_string(),
            extractor: ExtractorKind::Llm,
            ..nlquery_config()
        };
        let components = NlQueryComponents::from_config(&config, &sessions_config())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(components.extractor_kind(), ExtractorKind::Llm);
        let analyzer = components.analyzer.as_ref().unwrap();
        assert!(Arc::ptr_eq(analyzer.sessions(), &components.sessions));
        components.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_an_error() {
        let config = NlQueryConfig {
            provider: Some("ollama".to_string()),
            endpoint: "not a url".to_string(),
            model: "llama3.2".to_string(),
            ..nlquery_config()
        };
        let result = NlQueryComponents::from_config(&config, &sessions_config()).await;
        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("invalid endpoint"));
    }

    #[tokio::test]
    async fn test_llm_extractor_without_provider_is_an_error() {
        let config = NlQueryConfig {
            extractor: ExtractorKind::Llm,
            ..nlquery_config()
        };
        let result = NlQueryComponents::from_config(&config, &sessions_config()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_an_error() {
        let config = NlQueryConfig {
            provider: Some("openai".to_string()),
            endpoint: "https://api.example.com".to_string(),
            model: "gpt".to_string(),
            ..nlquery_config()
        };
        let result = NlQueryComponents::from_config(&config, &sessions_config()).await;
        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("unsupported provider"));
    }
}
