//! Model-backed extractor
//!
//! The model is used for slot filling only. Its raw output is deserialized
//! into `SearchParams`; anything outside the schema is discarded by serde,
//! and output that is not a JSON object of that shape is an error rather
//! than an empty result.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::NlQueryError;
use super::extractor::{Extractor, ExtractorKind};
use super::params::SearchParams;
use super::prompts::EXTRACTION_SYSTEM_PROMPT;
use crate::data::llm::{ChatMessage, ChatModel, GenerateOptions};

pub struct LlmExtractor {
    model: Arc<dyn ChatModel>,
    options: GenerateOptions,
}

impl LlmExtractor {
    /// JSON output mode is always forced on
    pub fn new(model: Arc<dyn ChatModel>, options: GenerateOptions) -> Self {
        Self {
            model,
            options: GenerateOptions {
                json_mode: true,
                ..options
            },
        }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchParams, NlQueryError> {
        let messages = [
            ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(text),
        ];

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NlQueryError::Cancelled),
            response = self.model.generate(&messages, &self.options) => response?,
        };
        let raw = response
            .first_content()
            .ok_or(NlQueryError::EmptyResponse)?;

        tracing::debug!(
            model = %self.model.model_name(),
            input = %text,
            response = %raw,
            "Model extraction response"
        );

        serde_json::from_str::<SearchParams>(raw).map_err(|e| NlQueryError::Parse {
            message: e.to_string(),
            raw: raw.to_string(),
        })
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Llm
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::llm::testing::ScriptedModel;
    use crate::data::llm::{ChatRole, GenerateResponse, ModelError};

    fn extractor(model: Arc<ScriptedModel>) -> LlmExtractor {
        LlmExtractor::new(
            model,
            GenerateOptions {
                temperature: 0.0,
                max_tokens: 256,
                json_mode: false,
            },
        )
    }

    #[tokio::test]
    async fn test_extract_discards_unknown_fields() {
        let model = Arc::new(ScriptedModel::replying(&[
            r#"{"service":"frontend","confidence":0.99,"reasoning":"user mentioned frontend"}"#,
        ]));
        let params = extractor(model)
            .extract("frontend traces", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            params,
            SearchParams {
                service: "frontend".to_string(),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_extract_sends_schema_prompt_in_json_mode() {
        let model = Arc::new(ScriptedModel::replying(&["{}"]));
        extractor(model.clone())
            .extract("slow checkout calls", &CancellationToken::new())
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        let (messages, options) = &calls[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("\"minDuration\""));
        assert_eq!(messages[1], ChatMessage::user("slow checkout calls"));
        assert!(options.json_mode);
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_tokens, 256);
    }

    #[tokio::test]
    async fn test_extract_invalid_json_keeps_raw() {
        let model = Arc::new(ScriptedModel::replying(&["Sure! The service is frontend."]));
        let err = extractor(model)
            .extract("frontend", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            NlQueryError::Parse { raw, .. } => assert_eq!(raw, "Sure! The service is frontend."),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_extract_wrong_field_type_is_parse_error() {
        let model = Arc::new(ScriptedModel::replying(&[r#"{"searchDepth":"many"}"#]));
        let err = extractor(model)
            .extract("many traces", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NlQueryError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_extract_no_choices_is_empty_response() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(GenerateResponse::default())]));
        let err = extractor(model)
            .extract("anything", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NlQueryError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_extract_provider_failure() {
        let model = Arc::new(ScriptedModel::new(vec![Err(ModelError::Status {
            status: 500,
            message: "connection refused".to_string(),
        })]));
        let err = extractor(model)
            .extract("anything", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NlQueryError::Provider(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_extract_array_output_is_parse_error() {
        let model = Arc::new(ScriptedModel::replying(&[
            r#"["evil-svc","DROP /x",{"k":"v"},"1s","2s",9]"#,
        ]));
        let err = extractor(model)
            .extract("anything", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            NlQueryError::Parse { raw, .. } => assert!(raw.starts_with("[\"evil-svc\"")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_extract_cancelled() {
        let model = Arc::new(
            ScriptedModel::replying(&[r#"{"service":"late"}"#]).with_delay(Duration::from_secs(10)),
        );
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            extractor(model).extract("frontend traces", &cancel),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(NlQueryError::Cancelled)));
    }

    #[tokio::test]
    async fn test_extract_already_cancelled_skips_model() {
        let model = Arc::new(ScriptedModel::replying(&["{}"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = extractor(model.clone()).extract("frontend", &cancel).await;
        assert!(matches!(result, Err(NlQueryError::Cancelled)));
        assert!(model.calls().is_empty());
    }
}
