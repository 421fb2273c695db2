//! The seam between the dispatcher and the network.

use crate::error::{DispatchError, Result};
use crate::redact::sanitize_reqwest_error;
use crate::request::{RequestBody, RequestDescriptor};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

/// Raw upstream answer. Status classification is left to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs exactly one HTTP exchange per call.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] when the upstream cannot be reached or the response
    /// body cannot be read. Non-2xx statuses are *not* errors at this layer.
    async fn execute(&self, request: RequestDescriptor) -> Result<UpstreamResponse>;
}

/// Production transport over a shared `reqwest` connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestUpstream {
    client: Client,
}

impl ReqwestUpstream {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn execute(&self, request: RequestDescriptor) -> Result<UpstreamResponse> {
        let RequestDescriptor {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        builder = match body {
            Some(RequestBody::Json(payload)) => builder.json(&payload),
            Some(RequestBody::Text(text)) => builder
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::Transport(sanitize_reqwest_error(&e)))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DispatchError::Transport(sanitize_reqwest_error(&e)))?;

        Ok(UpstreamResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaud_test_support::{CannedResponse, MockUpstream};
    use reqwest::Method;
    use serde_json::json;
    use url::Url;

    fn descriptor(base: &str, path: &str, method: Method, body: Option<RequestBody>) -> RequestDescriptor {
        RequestDescriptor {
            method,
            url: Url::parse(&format!("{base}{path}")).expect("url"),
            headers: vec![
                ("User-Agent".to_string(), "test-agent".to_string()),
                ("X-Store-Token".to_string(), "tok".to_string()),
            ],
            body,
        }
    }

    #[tokio::test]
    async fn sends_method_headers_and_text_body() {
        let mock = MockUpstream::start(CannedResponse::json(json!({ "ok": true })))
            .await
            .expect("mock upstream");
        let upstream = ReqwestUpstream::default();

        let resp = upstream
            .execute(descriptor(
                mock.base_url(),
                "/api/kv/x",
                Method::PUT,
                Some(RequestBody::Text("hello".to_string())),
            ))
            .await
            .expect("execute");
        assert_eq!(resp.status, 200);
        assert!(resp.is_success());

        let recorded = mock.requests();
        assert_eq!(recorded.len(), 1);
        let req = &recorded[0];
        assert_eq!(req.method, "PUT");
        assert_eq!(req.path, "/api/kv/x");
        assert_eq!(req.header("x-store-token"), Some("tok"));
        assert_eq!(req.header("user-agent"), Some("test-agent"));
        assert_eq!(req.body_text(), "hello");
    }

    #[tokio::test]
    async fn json_body_is_serialized() {
        let mock = MockUpstream::start(CannedResponse::json(json!({})))
            .await
            .expect("mock upstream");
        ReqwestUpstream::default()
            .execute(descriptor(
                mock.base_url(),
                "/api/messages",
                Method::POST,
                Some(RequestBody::Json(json!({ "to": "bob" }))),
            ))
            .await
            .expect("execute");

        let req = &mock.requests()[0];
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body_json(), Some(json!({ "to": "bob" })));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let mock = MockUpstream::start(CannedResponse::text(500, "boom"))
            .await
            .expect("mock upstream");
        let resp = ReqwestUpstream::default()
            .execute(descriptor(mock.base_url(), "/api/hn", Method::GET, None))
            .await
            .expect("execute");
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, b"boom");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        let err = ReqwestUpstream::default()
            .execute(descriptor("http://127.0.0.1:9", "/api/hn?key=s3cret", Method::GET, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)), "{err:?}");
        assert!(!err.to_string().contains("s3cret"));
    }
}
