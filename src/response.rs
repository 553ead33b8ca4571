//! Response - a transport envelope plus lazily materialized records.
//!
//! The envelope is kept as received. The first call to [`Response::data`]
//! parses the JSON:API document, syncs `included` and `data` into the store,
//! and caches the resulting records; later calls return the same records.

use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::Headers;
use crate::error::{Error, NetworkError, Result};
use crate::flatten::flatten_record;
use crate::jsonapi::{Document, Link, Links, ResourceObject};
use crate::network;
use crate::query::RequestOptions;
use crate::record::{follow_link, LinkCache, Record};
use crate::store::{Store, WeakStore};
use crate::utils::OneOrMany;

/// Records materialized from a response.
#[derive(Debug, Clone, Default)]
pub enum ResponseData {
    #[default]
    Empty,
    One(Record),
    Many(Vec<Record>),
}

impl ResponseData {
    /// The single record, or the first of many.
    pub fn record(&self) -> Option<&Record> {
        match self {
            ResponseData::Empty => None,
            ResponseData::One(record) => Some(record),
            ResponseData::Many(records) => records.first(),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        match self {
            ResponseData::Empty => Vec::new(),
            ResponseData::One(record) => vec![record.clone()],
            ResponseData::Many(records) => records.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResponseData::Empty => true,
            ResponseData::One(_) => false,
            ResponseData::Many(records) => records.is_empty(),
        }
    }
}

struct ResponseInner {
    raw: Arc<network::RawResponse>,
    store: WeakStore,
    options: Option<RequestOptions>,
    data: OnceLock<ResponseData>,
    link_cache: LinkCache,
}

/// The result of a transport call, as handed to callers.
///
/// Cheap to clone; clones share the materialized records.
#[derive(Clone)]
pub struct Response {
    inner: Arc<ResponseInner>,
}

impl Response {
    pub(crate) fn new(
        raw: network::RawResponse,
        store: &Store,
        options: Option<RequestOptions>,
    ) -> Self {
        Self::build(Arc::new(raw), store.downgrade(), options, OnceLock::new())
    }

    /// A response with no data and no error. No request was made.
    pub fn empty(store: &Store) -> Self {
        Self::new(network::RawResponse::default(), store, None)
    }

    /// A response not tied to any store; records it yields are detached.
    pub fn detached(raw: network::RawResponse) -> Self {
        Self::build(Arc::new(raw), WeakStore::default(), None, OnceLock::new())
    }

    fn build(
        raw: Arc<network::RawResponse>,
        store: WeakStore,
        options: Option<RequestOptions>,
        data: OnceLock<ResponseData>,
    ) -> Self {
        Self {
            inner: Arc::new(ResponseInner {
                raw,
                store,
                options,
                data,
                link_cache: LinkCache::new(),
            }),
        }
    }

    /// An equivalent response whose data is `record`.
    ///
    /// Used when the client's own object should be treated as canonical.
    pub fn replace_data(&self, record: Record) -> Response {
        Self::build(
            Arc::clone(&self.inner.raw),
            self.inner.store.clone(),
            self.inner.options.clone(),
            OnceLock::from(ResponseData::One(record)),
        )
    }

    /// Materialized records. Synced into the store on first access.
    pub fn data(&self) -> &ResponseData {
        self.inner.data.get_or_init(|| self.materialize())
    }

    pub fn record(&self) -> Option<Record> {
        self.data().record().cloned()
    }

    pub fn records(&self) -> Vec<Record> {
        self.data().records()
    }

    pub fn error(&self) -> Option<&NetworkError> {
        self.inner.raw.error.as_ref()
    }

    pub fn status(&self) -> Option<u16> {
        self.inner.raw.status
    }

    pub fn headers(&self) -> &Headers {
        &self.inner.raw.headers
    }

    pub fn request_headers(&self) -> &Headers {
        &self.inner.raw.request_headers
    }

    pub fn options(&self) -> Option<&RequestOptions> {
        self.inner.options.as_ref()
    }

    /// The parsed JSON body, untouched.
    pub fn raw_data(&self) -> Option<&Value> {
        self.inner.raw.data.as_ref()
    }

    /// Top-level `meta` of the document.
    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.raw_data()
            .and_then(|data| data.get("meta"))
            .and_then(Value::as_object)
    }

    /// Top-level `links` of the document.
    pub fn links(&self) -> Option<Links> {
        self.raw_data()
            .and_then(|data| data.get("links"))
            .and_then(|links| serde_json::from_value(links.clone()).ok())
    }

    /// Top-level `errors` of the document, if the server sent any.
    pub fn errors(&self) -> Option<&Vec<Value>> {
        self.raw_data()
            .and_then(|data| data.get("errors"))
            .and_then(Value::as_array)
    }

    /// Fail with the captured error, if any.
    pub fn into_result(self) -> Result<Response> {
        match self.error() {
            Some(error) => Err(Error::Network(error.clone())),
            None => Ok(self),
        }
    }

    /// Follow a top-level link (pagination and friends).
    ///
    /// Results are cached per name; `force` bypasses the cache.
    pub async fn fetch_link(&self, name: &str, force: bool) -> Result<Response> {
        if self.inner.store.upgrade().is_none() {
            return Err(Error::Detached(format!("response link {}", name)));
        }
        let store = self.inner.store.clone();
        let link: Option<Link> = self.links().and_then(|mut links| links.remove(name)).flatten();
        let options = self.inner.options.clone();

        let request = self.inner.link_cache.get_or_fetch(name, force, move || {
            follow_link(store, link, options).boxed()
        });

        Ok(request.await)
    }

    pub async fn first(&self) -> Result<Response> {
        self.fetch_link("first", false).await
    }

    pub async fn prev(&self) -> Result<Response> {
        self.fetch_link("prev", false).await
    }

    pub async fn next(&self) -> Result<Response> {
        self.fetch_link("next", false).await
    }

    pub async fn last(&self) -> Result<Response> {
        self.fetch_link("last", false).await
    }

    fn materialize(&self) -> ResponseData {
        if self.status() == Some(204) {
            return ResponseData::Empty;
        }
        let Some(body) = self.raw_data() else {
            return ResponseData::Empty;
        };

        let document: Document = match serde_json::from_value(body.clone()) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "response body is not a JSON:API document");
                return ResponseData::Empty;
            }
        };

        match self.inner.store.upgrade() {
            Some(store) => store.sync_document(&document).unwrap_or_else(|e| {
                warn!(error = %e, "failed to sync response into store");
                ResponseData::Empty
            }),
            None => detached_data(&document),
        }
    }
}

fn detached_data(document: &Document) -> ResponseData {
    let detached = |resource: &ResourceObject| Record::from_flattened(flatten_record(resource));
    match &document.data {
        None => ResponseData::Empty,
        Some(OneOrMany::One(resource)) => ResponseData::One(detached(resource)),
        Some(OneOrMany::Many(resources)) => {
            ResponseData::Many(resources.iter().map(detached).collect())
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("error", &self.error())
            .field("data", &self.inner.data.get())
            .finish()
    }
}
