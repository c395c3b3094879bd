//! Request Executor Port - performs one API call against the backend.
//!
//! The executor knows nothing about sessions or error taxonomy. It sends what
//! it is given and reports failures in two shapes: the server answered with a
//! non-2xx status, or no usable answer arrived at all.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call, relative to the executor's base URL.
///
/// The path is held as raw segments; adapters percent-encode each segment, so
/// values such as plan names can be pushed with [`ApiRequest::segment`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request for a `/`-separated relative path.
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn put(path: &str) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Appends one path segment verbatim.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches `Authorization: Bearer <token>`, replacing any earlier one.
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path joined with `/`, without query; used for logs and matching.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Bearer token carried by the request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Failure reported by the executor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("Server responded with status {status}")]
    Status { status: u16, body: Value },

    /// Nothing came back: connection failure, timeout, or reset.
    #[error("No response received: {0}")]
    NoResponse(String),

    /// A 2xx answer whose body could not be decoded.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-authored message from an error body.
    ///
    /// Looks at `message`, then `error`, then a bare string body.
    pub fn server_message(&self) -> Option<String> {
        let TransportError::Status { body, .. } = self else {
            return None;
        };
        match body {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(map) => ["message", "error"]
                .iter()
                .filter_map(|k| map.get(*k))
                .find_map(|v| v.as_str().filter(|s| !s.trim().is_empty()))
                .map(str::to_string),
            _ => None,
        }
    }
}

/// Port for performing API calls
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Perform one request
    ///
    /// # Returns
    /// The decoded JSON body; an empty body decodes to `Value::Null`
    ///
    /// # Errors
    /// Returns `TransportError` for non-2xx answers, missing answers, and
    /// undecodable bodies
    async fn request(&self, request: ApiRequest) -> Result<Value, TransportError>;

    /// Whether any request is currently outstanding
    fn in_flight(&self) -> bool;

    /// The most recent failure, cleared by the next success
    fn last_error(&self) -> Option<TransportError>;
}
