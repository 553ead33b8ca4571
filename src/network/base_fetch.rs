//! The request/response pipeline: header merging, body parsing, and status
//! classification.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::fetch::{Method, RequestInit};
use crate::config::{Config, Headers};
use crate::error::NetworkError;
use crate::utils::assign;

/// Outcome of a request before deserialization into records.
///
/// Always produced, whatever happened: failures travel in `error`, next to
/// whatever `status`, `headers` and `data` were captured before the failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub data: Option<Value>,
    pub error: Option<NetworkError>,
    pub headers: Headers,
    /// The per-request headers, before defaults were merged in.
    pub request_headers: Headers,
    /// `None` when the request never reached the server.
    pub status: Option<u16>,
}

impl RawResponse {
    /// View the envelope as a `Result`, failing on a captured error.
    pub fn into_result(self) -> Result<RawResponse, NetworkError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// Overridable request/response pipeline.
#[async_trait]
pub trait BaseFetch: Send + Sync {
    async fn base_fetch(
        &self,
        config: &Config,
        method: Method,
        url: &str,
        body: Option<&Value>,
        request_headers: &Headers,
    ) -> RawResponse;
}

/// Default pipeline on top of [`Config::fetch_reference`].
///
/// 1. Call the fetch primitive with default headers overridden by request headers.
/// 2. Parse the body as JSON; a failed parse on a 204 means `data = None`.
/// 3. A status of 400 or above becomes `Invalid HTTP status: <status>`.
/// 4. Any failure is captured in the returned envelope instead of propagating.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFetch;

impl StandardFetch {
    async fn execute(
        &self,
        config: &Config,
        method: Method,
        url: &str,
        body: Option<&Value>,
        request_headers: &Headers,
        response: &mut RawResponse,
    ) -> Result<(), NetworkError> {
        let fetch = config
            .fetch_reference
            .as_ref()
            .ok_or_else(|| NetworkError::Transport("no fetch reference configured".into()))?;

        let mut headers = Headers::new();
        assign(
            &mut headers,
            [Some(&config.default_headers), Some(request_headers)],
        );

        let body = match (method, body) {
            (Method::Get | Method::Delete, _) | (_, None) => None,
            (_, Some(body)) => Some(
                serde_json::to_string(body).map_err(|e| NetworkError::Body(e.to_string()))?,
            ),
        };

        debug!(%method, url, "sending request");
        let http = fetch
            .fetch(
                url,
                RequestInit {
                    method,
                    body,
                    headers,
                },
            )
            .await?;

        response.status = Some(http.status);
        response.headers = http.headers.clone();

        response.data = match http.json() {
            Ok(Value::Null) => None,
            Ok(data) => Some(data),
            Err(_) if http.status == 204 => None,
            Err(e) => return Err(e),
        };

        if http.status >= 400 {
            return Err(NetworkError::status(http.status));
        }

        debug!(%method, url, status = http.status, "request succeeded");
        Ok(())
    }
}

#[async_trait]
impl BaseFetch for StandardFetch {
    async fn base_fetch(
        &self,
        config: &Config,
        method: Method,
        url: &str,
        body: Option<&Value>,
        request_headers: &Headers,
    ) -> RawResponse {
        let mut response = RawResponse {
            request_headers: request_headers.clone(),
            ..Default::default()
        };

        if let Err(error) = self
            .execute(config, method, url, body, request_headers, &mut response)
            .await
        {
            warn!(%method, url, status = ?response.status, %error, "request failed");
            response.error = Some(error);
        }

        response
    }
}
