//! Configuration for the store and its network pipeline.
//!
//! `Config` is passed explicitly (behind an `Arc`) to the store, and from
//! there to every record and response. There is no process-wide singleton.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `base_url` | `"/"` | Prefix of every constructed request URL |
//! | `default_headers` | `content-type: application/vnd.api+json` | Merged under per-request headers |
//! | `fetch_reference` | reqwest client (`http` feature) | The HTTP primitive |
//! | `base_fetch` | [`StandardFetch`] | The request/response pipeline |
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_store::{Config, Store};
//!
//! let config = Config::new()
//!     .with_base_url("https://api.example.com/")
//!     .with_header("authorization", "Bearer token");
//! let store = Store::new(config);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::network::{BaseFetch, FetchReference, StandardFetch};

/// Request and response header map.
pub type Headers = BTreeMap<String, String>;

/// Content type of every JSON:API request.
pub const JSONAPI_CONTENT_TYPE: &str = "application/vnd.api+json";

#[derive(Clone)]
pub struct Config {
    /// Prefix for every constructed request URL.
    pub base_url: String,
    /// Headers sent with every request, overridden by per-request headers.
    pub default_headers: Headers,
    /// The HTTP primitive. `None` makes every request fail with a transport error.
    pub fetch_reference: Option<Arc<dyn FetchReference>>,
    /// The full request/response pipeline.
    pub base_fetch: Arc<dyn BaseFetch>,
}

impl Default for Config {
    fn default() -> Self {
        let mut default_headers = Headers::new();
        default_headers.insert("content-type".into(), JSONAPI_CONTENT_TYPE.into());

        Self {
            base_url: "/".into(),
            default_headers,
            fetch_reference: default_fetch_reference(),
            base_fetch: Arc::new(StandardFetch),
        }
    }
}

#[cfg(feature = "http")]
fn default_fetch_reference() -> Option<Arc<dyn FetchReference>> {
    Some(Arc::new(crate::network::ReqwestFetch::new()))
}

#[cfg(not(feature = "http"))]
fn default_fetch_reference() -> Option<Arc<dyn FetchReference>> {
    None
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Add or override a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_fetch_reference(mut self, fetch: Arc<dyn FetchReference>) -> Self {
        self.fetch_reference = Some(fetch);
        self
    }

    /// Replace the whole request/response pipeline.
    pub fn with_base_fetch(mut self, base_fetch: Arc<dyn BaseFetch>) -> Self {
        self.base_fetch = base_fetch;
        self
    }

    /// Prefix a path with the configured base URL.
    pub fn prefix_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("fetch_reference", &self.fetch_reference.is_some())
            .finish_non_exhaustive()
    }
}
