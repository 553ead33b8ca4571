//! The injected HTTP primitive.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Headers;
use crate::error::NetworkError;

/// HTTP verbs used by the store. GET and DELETE never carry a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the pipeline hands to the fetch primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInit {
    pub method: Method,
    /// JSON-serialized body.
    pub body: Option<String>,
    pub headers: Headers,
}

/// What the fetch primitive hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Parse the body as JSON. An empty body is a parse failure.
    pub fn json(&self) -> Result<Value, NetworkError> {
        serde_json::from_slice(&self.body).map_err(|e| NetworkError::Body(e.to_string()))
    }
}

/// The HTTP primitive the pipeline delegates to.
///
/// Implementations resolve with any status the server sent; they only fail
/// for transport-level problems.
#[async_trait]
pub trait FetchReference: Send + Sync {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<HttpResponse, NetworkError>;
}
