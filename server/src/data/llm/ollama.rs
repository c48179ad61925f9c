//! Ollama chat client (`/api/chat`, non-streaming)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatModel, Choice, GenerateOptions, GenerateResponse, ModelError};

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Max characters of an error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

/// Local Ollama model
pub struct OllamaModel {
    client: reqwest::Client,
    chat_url: Url,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: ChatRequestOptions,
}

#[derive(Serialize)]
struct ChatRequestOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaModel {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, ModelError> {
        if model.trim().is_empty() {
            return Err(ModelError::Config("model name is required".to_string()));
        }
        let base = endpoint.trim().trim_end_matches('/');
        let chat_url = Url::parse(&format!("{}/api/chat", base))
            .map_err(|e| ModelError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("nlquery/{}", CURRENT_VERSION))
            .build()?;

        Ok(Self {
            client,
            chat_url,
            model: model.trim().to_string(),
        })
    }

    fn request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &GenerateOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            format: options.json_mode.then_some("json"),
            options: ChatRequestOptions {
                temperature: options.temperature,
                num_predict: (options.max_tokens > 0).then_some(options.max_tokens),
            },
        }
    }
}

#[async_trait]
impl ChatModel for OllamaModel {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<GenerateResponse, ModelError> {
        let body = self.request(messages, options);

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            json_mode = options.json_mode,
            "Ollama chat request"
        );

        let resp = self
            .client
            .post(self.chat_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| text.chars().take(MAX_ERROR_BODY).collect());
            return Err(ModelError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Decode(e.to_string()))?;

        let choices = parsed
            .message
            .map(|m| m.content)
            .filter(|c| !c.is_empty())
            .map(|content| vec![Choice { content }])
            .unwrap_or_default();

        Ok(GenerateResponse { choices })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn options(json_mode: bool, max_tokens: u32) -> GenerateOptions {
        GenerateOptions {
            temperature: 0.0,
            max_tokens,
            json_mode,
        }
    }

    fn model(server: &MockServer) -> OllamaModel {
        OllamaModel::new(&server.base_url(), "llama3.2", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_new_validates_inputs() {
        assert!(matches!(
            OllamaModel::new("http://localhost:11434", " ", Duration::from_secs(1)),
            Err(ModelError::Config(_))
        ));
        assert!(matches!(
            OllamaModel::new("localhost without scheme", "m", Duration::from_secs(1)),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_chat_url_trailing_slash() {
        let m = OllamaModel::new("http://localhost:11434/", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(m.chat_url.as_str(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_request_body_json_mode() {
        let m = OllamaModel::new("http://localhost:11434", "llama3.2", Duration::from_secs(1))
            .unwrap();
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = serde_json::to_value(m.request(&messages, &options(true, 256))).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.2",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": false,
                "format": "json",
                "options": {"temperature": 0.0, "num_predict": 256}
            })
        );
    }

    #[test]
    fn test_request_body_plain_mode_without_limit() {
        let m = OllamaModel::new("http://localhost:11434", "llama3.2", Duration::from_secs(1))
            .unwrap();
        let messages = vec![ChatMessage::user("hi")];
        let body = serde_json::to_value(m.request(&messages, &options(false, 0))).unwrap();
        assert!(body.get("format").is_none());
        assert!(body["options"].get("num_predict").is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({
                    "model": "llama3.2",
                    "message": {"role": "assistant", "content": "{\"service\":\"frontend\"}"},
                    "done": true
                }));
            })
            .await;

        let resp = model(&server)
            .generate(&[ChatMessage::user("q")], &options(true, 256))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(resp.first_content(), Some("{\"service\":\"frontend\"}"));
    }

    #[tokio::test]
    async fn test_generate_empty_content_has_no_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200)
                    .json_body(json!({"message": {"role": "assistant", "content": ""}, "done": true}));
            })
            .await;

        let resp = model(&server)
            .generate(&[ChatMessage::user("q")], &options(false, 0))
            .await
            .unwrap();
        assert!(resp.choices.is_empty());
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(404)
                    .json_body(json!({"error": "model \"llama3.2\" not found, try pulling it first"}));
            })
            .await;

        let err = model(&server)
            .generate(&[ChatMessage::user("q")], &options(false, 0))
            .await
            .unwrap_err();
        match err {
            ModelError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_invalid_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).body("not json");
            })
            .await;

        let err = model(&server)
            .generate(&[ChatMessage::user("q")], &options(false, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }
}
