//! Jaeger HTTP query API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::types::{JaegerResponse, JaegerTrace};
use crate::data::error::TraceBackendError;
use crate::data::traits::TraceRepository;
use crate::data::types::{TraceData, TraceQuery};

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Max characters of an error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

/// Trace repository backed by the Jaeger query service (`/api/...`)
pub struct JaegerClient {
    client: reqwest::Client,
    base_url: String,
}

impl JaegerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TraceBackendError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| TraceBackendError::Config(format!("invalid url {base_url:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("nlquery/{}", CURRENT_VERSION))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, TraceBackendError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str())))
        };
        url.map_err(|e| TraceBackendError::Config(format!("invalid url {raw:?}: {e}")))
    }

    /// GET an endpoint and unwrap the `{data, errors}` envelope.
    ///
    /// With `allow_not_found`, a 404 status or an envelope whose errors are
    /// all 404s yields `Ok(None)`.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
        allow_not_found: bool,
    ) -> Result<Option<T>, TraceBackendError> {
        tracing::debug!(url = %url, "Jaeger query");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();

        if allow_not_found && status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(TraceBackendError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: JaegerResponse<T> =
            serde_json::from_str(&body).map_err(|e| TraceBackendError::Decode(e.to_string()))?;

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            if allow_not_found && errors.iter().all(|e| e.code == 404) {
                return Ok(None);
            }
            let message = errors
                .iter()
                .map(|e| e.msg.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TraceBackendError::Backend(message));
        }

        Ok(envelope.data)
    }
}

/// Build the query string for `/api/traces`
fn search_params(query: &TraceQuery) -> Result<Vec<(&'static str, String)>, TraceBackendError> {
    let mut params = Vec::new();
    if !query.service_name.is_empty() {
        params.push(("service", query.service_name.clone()));
    }
    if !query.operation_name.is_empty() {
        params.push(("operation", query.operation_name.clone()));
    }
    if !query.attributes.is_empty() {
        let tags = serde_json::to_string(&query.attributes)
            .map_err(|e| TraceBackendError::Config(e.to_string()))?;
        params.push(("tags", tags));
    }
    if let Some(min) = query.duration_min {
        params.push(("minDuration", format!("{}us", min.as_micros())));
    }
    if let Some(max) = query.duration_max {
        params.push(("maxDuration", format!("{}us", max.as_micros())));
    }
    if query.search_depth > 0 {
        params.push(("limit", query.search_depth.to_string()));
    }
    if let Some(start) = query.start_time_min {
        params.push(("start", start.timestamp_micros().to_string()));
    }
    if let Some(end) = query.start_time_max {
        params.push(("end", end.timestamp_micros().to_string()));
    }
    Ok(params)
}

/// Extract a readable message from an error body
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<JaegerResponse<serde_json::Value>>(body)
        && let Some(errors) = envelope.errors
        && !errors.is_empty()
    {
        return errors
            .iter()
            .map(|e| e.msg.as_str())
            .collect::<Vec<_>>()
            .join("; ");
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl TraceRepository for JaegerClient {
    async fn get_trace(&self, trace_id: &str) -> Result<Option<TraceData>, TraceBackendError> {
        let url = self.url(&format!("/api/traces/{}", trace_id), &[])?;
        let traces: Option<Vec<JaegerTrace>> = self.get_envelope(url, true).await?;
        Ok(traces
            .and_then(|t| t.into_iter().next())
            .map(JaegerTrace::into_trace_data))
    }

    async fn find_traces(&self, query: &TraceQuery) -> Result<Vec<TraceData>, TraceBackendError> {
        let url = self.url("/api/traces", &search_params(query)?)?;
        let traces: Option<Vec<JaegerTrace>> = self.get_envelope(url, false).await?;
        Ok(traces
            .unwrap_or_default()
            .into_iter()
            .map(JaegerTrace::into_trace_data)
            .collect())
    }

    async fn get_services(&self) -> Result<Vec<String>, TraceBackendError> {
        let url = self.url("/api/services", &[])?;
        let mut services: Vec<String> = self.get_envelope(url, false).await?.unwrap_or_default();
        services.sort();
        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::json;

    const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

    fn client(server: &MockServer) -> JaegerClient {
        JaegerClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    fn trace_body() -> serde_json::Value {
        json!({
            "data": [{
                "traceID": TRACE_ID,
                "spans": [{
                    "traceID": TRACE_ID,
                    "spanID": "00f067aa0ba902b7",
                    "operationName": "GET /checkout",
                    "startTime": 1700000000000000i64,
                    "duration": 1500,
                    "processID": "p1"
                }],
                "processes": {"p1": {"serviceName": "frontend"}}
            }],
            "errors": null
        })
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = JaegerClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(TraceBackendError::Config(_))));
    }

    #[test]
    fn test_search_params_mapping() {
        let mut query = TraceQuery {
            service_name: "payment-service".to_string(),
            duration_min: Some(Duration::from_secs(2)),
            search_depth: 20,
            start_time_min: Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
            ..Default::default()
        };
        query
            .attributes
            .insert("http.status_code".to_string(), "500".to_string());

        let params = search_params(&query).unwrap();
        assert_eq!(
            params,
            vec![
                ("service", "payment-service".to_string()),
                ("tags", r#"{"http.status_code":"500"}"#.to_string()),
                ("minDuration", "2000000us".to_string()),
                ("limit", "20".to_string()),
                ("start", "1700000000000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_params_empty_query() {
        assert!(search_params(&TraceQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = r#"{"data":null,"errors":[{"code":400,"msg":"parameter 'service' is required"}]}"#;
        assert_eq!(error_message(body), "parameter 'service' is required");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_get_trace_found() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/traces/{}", TRACE_ID));
                then.status(200).json_body(trace_body());
            })
            .await;

        let trace = client(&server).get_trace(TRACE_ID).await.unwrap().unwrap();
        mock.assert_async().await;
        assert_eq!(trace.trace_id, TRACE_ID);
        assert_eq!(trace.spans[0].service, "frontend");
        assert_eq!(trace.spans[0].operation, "GET /checkout");
    }

    #[tokio::test]
    async fn test_get_trace_not_found_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/traces/{}", TRACE_ID));
                then.status(404).json_body(json!({
                    "data": null,
                    "errors": [{"code": 404, "msg": "trace not found"}]
                }));
            })
            .await;

        let trace = client(&server).get_trace(TRACE_ID).await.unwrap();
        assert!(trace.is_none());
    }

    #[tokio::test]
    async fn test_get_trace_empty_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/traces/{}", TRACE_ID));
                then.status(200).json_body(json!({"data": [], "errors": null}));
            })
            .await;

        assert!(client(&server).get_trace(TRACE_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_traces_sends_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/traces")
                    .query_param("service", "frontend")
                    .query_param("limit", "5");
                then.status(200).json_body(trace_body());
            })
            .await;

        let query = TraceQuery {
            service_name: "frontend".to_string(),
            search_depth: 5,
            ..Default::default()
        };
        let traces = client(&server).find_traces(&query).await.unwrap();
        mock.assert_async().await;
        assert_eq!(traces.len(), 1);
    }

    #[tokio::test]
    async fn test_find_traces_backend_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/traces");
                then.status(400).json_body(json!({
                    "data": null,
                    "errors": [{"code": 400, "msg": "parameter 'service' is required"}]
                }));
            })
            .await;

        let err = client(&server)
            .find_traces(&TraceQuery::default())
            .await
            .unwrap_err();
        match err {
            TraceBackendError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "parameter 'service' is required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_services_sorted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/services");
                then.status(200)
                    .json_body(json!({"data": ["payment-service", "frontend"], "errors": null}));
            })
            .await;

        let services = client(&server).get_services().await.unwrap();
        assert_eq!(services, vec!["frontend", "payment-service"]);
    }

    #[tokio::test]
    async fn test_get_services_null_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/services");
                then.status(200).json_body(json!({"data": null, "errors": null}));
            })
            .await;

        assert!(client(&server).get_services().await.unwrap().is_empty());
    }
}
