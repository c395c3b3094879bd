//! reqwest-backed request executor.
//!
//! Sends JSON requests relative to the API base URL and reports failures in
//! the port's two shapes. Timeouts and connection errors become
//! `TransportError::NoResponse`.
//!
//! # Configuration
//!
//! ```ignore
//! let executor = ReqwestExecutor::new("http://localhost:8080/api", Duration::from_secs(10))?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

use super::activity::RequestActivity;
use crate::ports::{ApiRequest, HttpMethod, RequestExecutor, TransportError};

/// Errors building the executor.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// Request executor over a shared `reqwest::Client`.
pub struct ReqwestExecutor {
    base_url: Url,
    client: Client,
    activity: RequestActivity,
}

impl ReqwestExecutor {
    /// Create an executor for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientError` if the URL is unusable as a base or the TLS
    /// backend cannot be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpClientError> {
        let parsed = Url::parse(base_url).map_err(|e| HttpClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(HttpClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpClientError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: parsed,
            client,
            activity: RequestActivity::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(request.segments());
        }
        url
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build(&self, request: &ApiRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(Self::method(request.method), self.url_for(request));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let response = self.build(request).send().await.map_err(|e| {
            tracing::warn!(
                method = %request.method,
                path = %request.path(),
                timeout = e.is_timeout(),
                "API request got no response: {}",
                e
            );
            TransportError::NoResponse(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(path = %request.path(), "Failed to read API response body: {}", e);
            TransportError::NoResponse(e.to_string())
        })?;

        if status.is_success() {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(path = %request.path(), "Undecodable API response: {}", e);
                TransportError::MalformedBody(e.to_string())
            });
        }

        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        tracing::debug!(
            method = %request.method,
            path = %request.path(),
            status = status.as_u16(),
            "API request rejected"
        );
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn request(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let _in_flight = self.activity.begin();
        tracing::debug!(method = %request.method, path = %request.path(), "Sending API request");

        let result = self.send(&request).await;
        self.activity.record(&result);
        result
    }

    fn in_flight(&self) -> bool {
        self.activity.in_flight()
    }

    fn last_error(&self) -> Option<TransportError> {
        self.activity.last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    // ════════════════════════════════════════════════════════════════════════════
    // One-shot HTTP responder
    // ════════════════════════════════════════════════════════════════════════════

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0)
    }

    /// Accepts one connection, answers with `status` and `body`, and yields
    /// the raw request text.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..end]).to_string();
                    if buf.len() >= end + 4 + content_length(&head) {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}/api", addr), handle)
    }

    fn executor(base: &str) -> ReqwestExecutor {
        ReqwestExecutor::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(ReqwestExecutor::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ReqwestExecutor::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn segments_are_appended_and_encoded() {
        let exec = executor("http://localhost:8080/api/");
        let url = exec.url_for(&ApiRequest::get("subscription/plans/name").segment("Gold Plus"));
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/subscription/plans/name/Gold%20Plus"
        );
    }

    #[tokio::test]
    async fn success_returns_decoded_json_and_sends_headers() {
        let (base, server) = serve_once("200 OK", r#"{"subscriptionId":7}"#).await;
        let exec = executor(&base);

        let value = exec
            .request(
                ApiRequest::post("subscription/verify-payment", json!({ "amount": 9000 }))
                    .with_bearer("tok")
                    .query("x", "a b"),
            )
            .await
            .unwrap();

        assert_eq!(value, json!({ "subscriptionId": 7 }));
        assert!(exec.last_error().is_none());
        assert!(!exec.in_flight());

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("POST /api/subscription/verify-payment?x=a+b HTTP/1.1"));
        assert!(lower.contains("authorization: bearer tok"));
        assert!(raw.contains(r#""amount":9000"#));
    }

    #[tokio::test]
    async fn non_success_carries_status_and_body() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"message":"plan not found"}"#).await;
        let exec = executor(&base);

        let err = exec.request(ApiRequest::get("subscription/plans/name/x")).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.server_message().as_deref(), Some("plan not found"));
        assert_eq!(exec.last_error(), Some(err));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let (base, _server) = serve_once("200 OK", "").await;
        let value = executor(&base)
            .request(ApiRequest::delete("payment/methods/3"))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn undecodable_success_body_is_malformed() {
        let (base, _server) = serve_once("200 OK", "<html>").await;
        let err = executor(&base)
            .request(ApiRequest::get("subscription/info"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_no_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = executor(&format!("http://{}/api", addr))
            .request(ApiRequest::get("subscription/plans"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NoResponse(_)));
    }
}
