//! HTTP executor boundary
//!
//! The dispatcher never talks to an HTTP library directly. It hands an
//! [`HttpRequest`] to an [`HttpExecutor`] and gets back either a complete
//! [`HttpResponse`] (whatever its status) or a [`TransportError`] when no
//! response could be obtained at all.

mod http;

pub use http::ReqwestExecutor;

use crate::config::ClientConfig;
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Content type attached to every request that carries a body
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP methods supported by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request against one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Build a request, attaching the JSON content type only when `body` is non-empty
    pub fn new(method: HttpMethod, url: String, body: &str) -> Self {
        let mut headers = Vec::new();
        if !body.is_empty() {
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        Self {
            method,
            url,
            headers,
            body: body.to_string(),
        }
    }

    /// Look up a header value, ignoring ASCII case of the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response returned by a node, whatever its status code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// The executor could not obtain any response from the node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

/// Executes single HTTP requests.
///
/// Implementations own connection pooling, TLS and proxies. They must not
/// retry on their own; retries across nodes belong to the dispatcher.
pub trait HttpExecutor: Send {
    fn execute(&mut self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;

    /// Rebuild internal state after the client configuration changed
    fn configure(&mut self, _config: &ClientConfig) -> Result<()> {
        Ok(())
    }
}
