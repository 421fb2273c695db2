//! The dispatcher: resolve → validate → build → execute → envelope.

use crate::config::{ClientConfig, ConfigError, Credentials};
use crate::error::{DispatchError, Result};
use crate::redact::redact_url;
use crate::registry::{self, Operation};
use crate::request::{RequestDescriptor, build_request};
use crate::upstream::{ReqwestUpstream, Upstream};
use crate::validate::validate_arguments;
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Uniform result shape returned to the caller for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    /// Upstream JSON, pretty-printed.
    Success(String),
    /// Human-readable failure message.
    Error(String),
}

impl ResponseEnvelope {
    #[must_use]
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(body) => match serde_json::to_string_pretty(&body) {
                Ok(text) => Self::Success(text),
                Err(e) => Self::Error(
                    DispatchError::Internal(format!("failed to render response: {e}")).to_string(),
                ),
            },
            Err(e) => Self::Error(e.to_string()),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Error(text) => text,
        }
    }
}

impl From<ResponseEnvelope> for CallToolResult {
    fn from(envelope: ResponseEnvelope) -> Self {
        match envelope {
            ResponseEnvelope::Success(text) => Self::success(vec![Content::text(text)]),
            ResponseEnvelope::Error(text) => Self::error(vec![Content::text(text)]),
        }
    }
}

/// Executes operation calls end-to-end.
///
/// Immutable after construction and cheap to clone; concurrent calls share nothing but the
/// upstream transport.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    base_url: Url,
    credentials: Credentials,
    upstream: Arc<dyn Upstream>,
}

impl Dispatcher {
    /// Build a dispatcher talking to the configured origin over `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Self::with_upstream(config, Arc::new(ReqwestUpstream::new(client)))
    }

    /// Build a dispatcher over an arbitrary transport (used by tests and embedders).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_upstream(
        config: ClientConfig,
        upstream: Arc<dyn Upstream>,
    ) -> std::result::Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            inner: Arc::new(DispatcherInner {
                base_url,
                credentials: config.credentials,
                upstream,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// MCP tool descriptors for every registered operation.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        registry::list_operations().map(Operation::to_tool).collect()
    }

    /// Resolve, validate and build the request for one call without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownOperation`], [`DispatchError::InvalidArgument`] or
    /// [`DispatchError::Internal`] (mapping rule could not be applied).
    pub fn prepare(&self, name: &str, arguments: &Value) -> Result<RequestDescriptor> {
        let op = registry::resolve(name)?;
        let args = validate_arguments(op, arguments)?;
        let credential = op.credential.and_then(|kind| {
            args.credential
                .as_ref()
                .or_else(|| self.inner.credentials.get(kind))
        });
        build_request(&self.inner.base_url, op, &args, credential)
    }

    /// Execute one operation and return the upstream JSON body.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`] kind; see the variant docs.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<Value> {
        let request = self.prepare(name, arguments)?;
        let method = request.method.clone();
        let url = redact_url(&request.url);
        debug!(operation = %name, %method, %url, "dispatching upstream request");

        let started = Instant::now();
        let response = self.inner.upstream.execute(request).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !response.is_success() {
            warn!(
                operation = %name,
                %method,
                %url,
                status = response.status,
                elapsed_ms,
                "upstream returned an error status"
            );
            return Err(DispatchError::upstream(response.status, &response.body));
        }

        info!(
            operation = %name,
            %method,
            %url,
            status = response.status,
            elapsed_ms,
            "upstream call succeeded"
        );
        parse_body(&response.body)
    }

    /// Execute one operation and always produce an envelope.
    pub async fn call(&self, name: &str, arguments: &Value) -> ResponseEnvelope {
        let result = self.invoke(name, arguments).await;
        if let Err(e) = &result {
            warn!(operation = %name, kind = e.kind(), error = %e, "operation failed");
        }
        ResponseEnvelope::from_result(result)
    }

    /// [`Dispatcher::call`], shaped as an MCP tool result.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> CallToolResult {
        self.call(name, arguments).await.into()
    }
}

fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| DispatchError::Internal(format!("upstream returned invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::error::UPSTREAM_EXCERPT_CHARS;
    use crate::request::RequestBody;
    use crate::upstream::UpstreamResponse;
    use async_trait::async_trait;
    use klaud_test_support::{CannedResponse, MockUpstream};
    use parking_lot::Mutex;
    use reqwest::Method;
    use serde_json::json;

    /// Records every request and answers with a fixed response.
    struct RecordingUpstream {
        requests: Mutex<Vec<RequestDescriptor>>,
        reply: Result<UpstreamResponse>,
    }

    impl RecordingUpstream {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                reply: Ok(UpstreamResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                reply: Err(DispatchError::Transport(message.to_string())),
            })
        }

        fn attempts(&self) -> usize {
            self.requests.lock().len()
        }

        fn last(&self) -> RequestDescriptor {
            self.requests.lock().last().cloned().expect("a request was sent")
        }
    }

    #[async_trait]
    impl Upstream for RecordingUpstream {
        async fn execute(&self, request: RequestDescriptor) -> Result<UpstreamResponse> {
            self.requests.lock().push(request);
            match &self.reply {
                Ok(resp) => Ok(resp.clone()),
                Err(DispatchError::Transport(m)) => Err(DispatchError::Transport(m.clone())),
                Err(e) => Err(DispatchError::Internal(e.to_string())),
            }
        }
    }

    fn dispatcher(upstream: Arc<RecordingUpstream>, credentials: Credentials) -> Dispatcher {
        Dispatcher::with_upstream(
            ClientConfig {
                base_url: "http://upstream.test".to_string(),
                credentials,
            },
            upstream,
        )
        .expect("valid config")
    }

    #[tokio::test]
    async fn unknown_operation_fails_without_request() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let err = d.invoke("hn_top_stories", &json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownOperation(_)));
        assert_eq!(upstream.attempts(), 0);
    }

    #[tokio::test]
    async fn missing_required_parameters_never_reach_upstream() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());

        for op in registry::list_operations() {
            for required in op.required_params() {
                let mut args = serde_json::Map::new();
                for other in op.required_params().filter(|p| p.name != required.name) {
                    let v = match other.kind {
                        crate::registry::ParamType::StringArray { .. } => json!(["a"]),
                        crate::registry::ParamType::Url => json!("https://example.com"),
                        _ => json!("v"),
                    };
                    args.insert(other.name.to_string(), v);
                }
                let err = d.invoke(op.name, &Value::Object(args)).await.unwrap_err();
                match err {
                    DispatchError::InvalidArgument { parameter, .. } => {
                        assert_eq!(parameter, required.name, "operation '{}'", op.name);
                    }
                    other => panic!("operation '{}': unexpected {other:?}", op.name),
                }
            }
        }
        assert_eq!(upstream.attempts(), 0);
    }

    #[tokio::test]
    async fn story_listing_returns_upstream_json_pretty_printed() {
        let body = json!({ "posts": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] });
        let upstream = RecordingUpstream::replying(200, &body.to_string());
        let d = dispatcher(upstream.clone(), Credentials::default());

        let envelope = d
            .call("search_hackernews", &json!({ "category": "ai", "limit": 3 }))
            .await;

        assert_eq!(
            envelope,
            ResponseEnvelope::Success(serde_json::to_string_pretty(&body).expect("json"))
        );
        let req = upstream.last();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url.as_str(), "http://upstream.test/api/hn?category=ai&limit=3");
    }

    #[tokio::test]
    async fn success_envelope_keeps_upstream_key_order() {
        let upstream =
            RecordingUpstream::replying(200, r#"{"posts":[{"title":"t","id":1}],"count":1}"#);
        let d = dispatcher(upstream, Credentials::default());

        let envelope = d.call("search_hackernews", &json!({})).await;

        let expected = "{\n  \"posts\": [\n    {\n      \"title\": \"t\",\n      \"id\": 1\n    }\n  ],\n  \"count\": 1\n}";
        assert_eq!(envelope, ResponseEnvelope::Success(expected.to_string()));
    }

    #[tokio::test]
    async fn configured_api_key_is_attached() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let creds = Credentials {
            api_key: Secret::new("env-key"),
            ..Credentials::default()
        };
        let d = dispatcher(upstream.clone(), creds);
        d.invoke("search_hackernews", &json!({ "category": "ai", "limit": 3 }))
            .await
            .expect("success");
        assert_eq!(
            upstream.last().url.query(),
            Some("category=ai&limit=3&key=env-key")
        );
    }

    #[tokio::test]
    async fn call_argument_credential_beats_configured_one() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let creds = Credentials {
            store_token: Secret::new("env-token"),
            ..Credentials::default()
        };
        let d = dispatcher(upstream.clone(), creds);

        d.invoke("kv_get", &json!({ "key": "x", "token": "call-token" }))
            .await
            .expect("success");
        assert_eq!(upstream.last().header("x-store-token"), Some("call-token"));

        d.invoke("kv_get", &json!({ "key": "x" }))
            .await
            .expect("success");
        assert_eq!(upstream.last().header("x-store-token"), Some("env-token"));

        d.invoke("kv_get", &json!({ "key": "x", "token": "" }))
            .await
            .expect("success");
        assert_eq!(upstream.last().header("x-store-token"), Some("env-token"));
    }

    #[tokio::test]
    async fn no_credential_means_no_credential_header() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());
        d.invoke("channel_list", &json!({})).await.expect("success");
        let req = upstream.last();
        assert!(req.header("authorization").is_none());
        assert!(req.url.query().is_none());
    }

    #[tokio::test]
    async fn credentials_of_other_families_are_not_attached() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let creds = Credentials {
            api_key: Secret::new("env-key"),
            store_token: Secret::new("store"),
            agent_token: None,
        };
        let d = dispatcher(upstream.clone(), creds);
        d.invoke("project_list", &json!({})).await.expect("success");
        let req = upstream.last();
        assert!(req.url.query().is_none());
        assert!(req.header("x-store-token").is_none());
        assert!(req.header("authorization").is_none());
    }

    #[tokio::test]
    async fn kv_write_scenario() {
        let upstream = RecordingUpstream::replying(200, r#"{"ok":true}"#);
        let d = dispatcher(upstream.clone(), Credentials::default());
        d.invoke(
            "kv_set",
            &json!({ "key": "x", "value": "hello", "token": "tok123" }),
        )
        .await
        .expect("success");

        let req = upstream.last();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.url.path(), "/api/kv/x");
        assert_eq!(req.header("x-store-token"), Some("tok123"));
        assert_eq!(req.body, Some(RequestBody::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn upstream_error_status_becomes_error_envelope() {
        let upstream = RecordingUpstream::replying(500, "boom");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let envelope = d.call("search_pubmed", &json!({ "query": "CRISPR" })).await;
        assert!(envelope.is_error());
        assert!(envelope.text().contains("500"));
        assert!(envelope.text().contains("boom"));
        assert_eq!(upstream.attempts(), 1);
    }

    #[tokio::test]
    async fn upstream_error_excerpt_is_truncated() {
        let long = "x".repeat(1000);
        let upstream = RecordingUpstream::replying(503, &long);
        let d = dispatcher(upstream, Credentials::default());
        let err = d
            .invoke("search_pubmed", &json!({ "query": "CRISPR" }))
            .await
            .unwrap_err();
        let DispatchError::Upstream { status, excerpt } = err else {
            panic!("expected upstream error");
        };
        assert_eq!(status, 503);
        assert_eq!(excerpt.len(), UPSTREAM_EXCERPT_CHARS);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_locally() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let err = d
            .invoke("extract_url", &json!({ "url": "not-a-url" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument { ref parameter, .. } if parameter == "url"));
        assert_eq!(upstream.attempts(), 0);
    }

    #[tokio::test]
    async fn drug_search_without_query_or_target_is_rejected_locally() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let envelope = d.call("search_drugs", &json!({})).await;
        assert!(envelope.is_error());
        assert!(envelope.text().contains("query"));
        assert!(envelope.text().contains("target"));
        assert_eq!(upstream.attempts(), 0);
    }

    #[tokio::test]
    async fn transport_failures_are_reported_once() {
        let upstream = RecordingUpstream::failing("connection refused");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let envelope = d.call("search_hackernews", &json!({})).await;
        assert_eq!(
            envelope,
            ResponseEnvelope::Error("Upstream request failed: connection refused".to_string())
        );
        assert_eq!(upstream.attempts(), 1);
    }

    #[tokio::test]
    async fn invalid_json_success_body_is_internal_error() {
        let upstream = RecordingUpstream::replying(200, "<html>");
        let d = dispatcher(upstream, Credentials::default());
        let err = d.invoke("search_hackernews", &json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::Internal(_)));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let upstream = RecordingUpstream::replying(204, "");
        let d = dispatcher(upstream, Credentials::default());
        let envelope = d.call("agent_block", &json!({ "agent": "spam-bot" })).await;
        assert_eq!(envelope, ResponseEnvelope::Success("null".to_string()));
    }

    #[tokio::test]
    async fn identical_reads_build_identical_independent_requests() {
        let upstream = RecordingUpstream::replying(200, "{}");
        let d = dispatcher(upstream.clone(), Credentials::default());
        let args = json!({ "query": "LLM agents", "category": "cs.AI" });
        d.invoke("search_arxiv", &args).await.expect("first");
        d.invoke("search_arxiv", &args).await.expect("second");

        let requests = upstream.requests.lock().clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn error_envelopes_never_echo_credentials() {
        let upstream = RecordingUpstream::replying(401, "unauthorized");
        let d = dispatcher(upstream, Credentials::default());
        let envelope = d
            .call("kv_get", &json!({ "key": "x", "token": "tok-secret" }))
            .await;
        assert!(envelope.is_error());
        assert!(!envelope.text().contains("tok-secret"));
    }

    #[test]
    fn envelope_converts_to_call_tool_result() {
        let ok: CallToolResult = ResponseEnvelope::Success("{}".to_string()).into();
        assert_eq!(ok.is_error, Some(false));
        let err: CallToolResult = ResponseEnvelope::Error("nope".to_string()).into();
        assert_eq!(err.is_error, Some(true));
        let v = serde_json::to_value(&err).expect("serializes");
        assert_eq!(v["content"][0]["text"], json!("nope"));
    }

    #[test]
    fn list_tools_covers_catalog() {
        let d = dispatcher(RecordingUpstream::replying(200, "{}"), Credentials::default());
        let tools = d.list_tools();
        assert_eq!(tools.len(), registry::list_operations().count());
        assert!(tools.iter().any(|t| t.name == "search_drugs"));
    }

    #[tokio::test]
    async fn end_to_end_over_http() {
        let mock = MockUpstream::start(CannedResponse::json(json!({ "posts": [1, 2, 3] })))
            .await
            .expect("mock upstream");
        let d = Dispatcher::new(ClientConfig {
            base_url: mock.base_url().to_string(),
            credentials: Credentials {
                api_key: Secret::new("k"),
                ..Credentials::default()
            },
        })
        .expect("dispatcher");

        let result = d
            .call_tool("search_hackernews", &json!({ "category": "ai", "limit": 3 }))
            .await;
        assert_eq!(result.is_error, Some(false));

        let recorded = mock.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].path, "/api/hn");
        assert_eq!(
            recorded[0].query.as_deref(),
            Some("category=ai&limit=3&key=k")
        );
        assert!(
            recorded[0]
                .header("user-agent")
                .is_some_and(|ua| ua.starts_with("klaud-api-mcp/"))
        );
    }

    #[tokio::test]
    async fn end_to_end_upstream_failure_over_http() {
        let mock = MockUpstream::start(CannedResponse::text(500, "boom"))
            .await
            .expect("mock upstream");
        let d = Dispatcher::new(ClientConfig {
            base_url: mock.base_url().to_string(),
            credentials: Credentials::default(),
        })
        .expect("dispatcher");

        let envelope = d.call("crypto_prices", &json!({ "ids": ["solana"] })).await;
        assert_eq!(envelope, ResponseEnvelope::Error("API 500: boom".to_string()));
    }
}
