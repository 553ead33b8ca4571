//! Network transport: the fetch primitive, the request pipeline, and the
//! verb helpers used by stores and records.
//!
//! Every helper resolves to a [`Response`]. HTTP and transport failures are
//! carried in [`Response::error`]; only [`handle_response`] turns them into
//! an `Err`.

mod base_fetch;
mod fetch;
#[cfg(feature = "http")]
mod http;

pub use base_fetch::{BaseFetch, RawResponse, StandardFetch};
pub use fetch::{FetchReference, HttpResponse, Method, RequestInit};
#[cfg(feature = "http")]
pub use http::ReqwestFetch;

use serde_json::Value;
use tracing::debug;

use crate::config::Headers;
use crate::error::{Error, Result};
use crate::jsonapi::Link;
use crate::query::RequestOptions;
use crate::record::{PendingCreate, Record};
use crate::response::Response;
use crate::store::Store;

/// Run one request through the configured pipeline.
///
/// Headers come from `options`.
pub async fn fetch(
    store: &Store,
    method: Method,
    url: &str,
    data: Option<&Value>,
    options: Option<&RequestOptions>,
) -> Response {
    let headers = options.and_then(RequestOptions::headers);
    send(store, method, url, data, headers, options).await
}

pub async fn read(
    store: &Store,
    url: &str,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    send(store, Method::Get, url, None, headers, options).await
}

pub async fn create(
    store: &Store,
    url: &str,
    data: &Value,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    send(store, Method::Post, url, Some(data), headers, options).await
}

pub async fn update(
    store: &Store,
    url: &str,
    data: &Value,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    send(store, Method::Patch, url, Some(data), headers, options).await
}

pub async fn remove(
    store: &Store,
    url: &str,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    send(store, Method::Delete, url, None, headers, options).await
}

/// Follow a link. A missing link, or one without an href, resolves to an
/// empty response and no request is made.
pub async fn fetch_link(
    link: Option<&Link>,
    store: &Store,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    match link.and_then(Link::href) {
        Some(href) => read(store, href, headers, options).await,
        None => {
            debug!("link has no href, skipping request");
            Response::empty(store)
        }
    }
}

async fn send(
    store: &Store,
    method: Method,
    url: &str,
    data: Option<&Value>,
    headers: Option<&Headers>,
    options: Option<&RequestOptions>,
) -> Response {
    let config = store.config();
    let empty = Headers::new();
    let raw = config
        .base_fetch
        .base_fetch(config, method, url, data, headers.unwrap_or(&empty))
        .await;
    Response::new(raw, store, options.cloned())
}

/// Post-process the response of a save.
///
/// - A captured error becomes `Err`, before any state changes.
/// - 204: `record` is flagged persisted and returned.
/// - 201: the created resource is returned, carrying a [`PendingCreate`]
///   that points back at `record` (and `relationship`, if any).
/// - Any other success: `record` is flagged persisted and returned as the
///   canonical data.
pub fn handle_response(
    record: &Record,
    relationship: Option<&str>,
    response: Response,
) -> Result<Record> {
    if let Some(error) = response.error() {
        return Err(Error::Network(error.clone()));
    }

    match response.status() {
        Some(204) => {
            record.set_persisted(true);
            Ok(record.clone())
        }
        Some(201) => match response.record() {
            Some(created) if !created.ptr_eq(record) => {
                created.set_pending_create(Some(PendingCreate {
                    related: record.clone(),
                    prop: relationship.map(str::to_string),
                }));
                Ok(created)
            }
            _ => {
                record.set_persisted(true);
                Ok(record.clone())
            }
        },
        _ => {
            record.set_persisted(true);
            Ok(record.clone())
        }
    }
}
