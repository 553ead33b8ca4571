//! reqwest-backed fetch primitive.
//!
//! Requires the `http` feature.

use async_trait::async_trait;

use super::fetch::{FetchReference, HttpResponse, Method, RequestInit};
use crate::config::Headers;
use crate::error::NetworkError;

/// [`FetchReference`] over a `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing client (custom timeouts, proxies, TLS, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl FetchReference for ReqwestFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<HttpResponse, NetworkError> {
        let mut request = self.client.request(to_reqwest(init.method), url);
        for (name, value) in &init.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = init.body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
