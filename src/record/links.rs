//! Following a record's links, with per-record caching.

use futures::FutureExt;

use super::Record;
use crate::error::Result;
use crate::jsonapi::Link;
use crate::network::{self, RawResponse};
use crate::query::RequestOptions;
use crate::response::Response;
use crate::store::WeakStore;

impl Record {
    /// Fetch the resource behind the link `name` (e.g. `self`).
    ///
    /// The first fetch per name is cached and shared; later calls return the
    /// same response until `force` is set or the entry is invalidated. A
    /// missing link yields an empty response without a request.
    pub async fn fetch_link(
        &self,
        name: &str,
        options: Option<&RequestOptions>,
        force: bool,
    ) -> Result<Response> {
        self.store()?;
        let store = self.inner.store.clone();
        let link = self.link(name);
        let options = options.cloned();

        let request = self.inner.link_cache.get_or_fetch(name, force, move || {
            follow(store, link, options).boxed()
        });

        let response = request.await;
        Ok(self.resolve_pending(response))
    }

    /// Fetch the link `name` of `relationship` (e.g. `related`).
    ///
    /// Cached per relationship and name, independently of [`fetch_link`](Self::fetch_link).
    pub async fn fetch_relationship_link(
        &self,
        relationship: &str,
        name: &str,
        options: Option<&RequestOptions>,
        force: bool,
    ) -> Result<Response> {
        self.store()?;
        let store = self.inner.store.clone();
        let link = self.relationship_link(relationship, name);
        let options = options.cloned();
        let key = relationship_key(relationship, name);

        let request = self.inner.relationship_link_cache.get_or_fetch(&key, force, move || {
            follow(store, link, options).boxed()
        });

        Ok(request.await)
    }

    pub fn invalidate_link(&self, name: &str) -> bool {
        self.inner.link_cache.invalidate(name)
    }

    pub fn invalidate_links(&self) {
        self.inner.link_cache.invalidate_all();
    }

    pub fn invalidate_relationship_link(&self, relationship: &str, name: &str) -> bool {
        self.inner
            .relationship_link_cache
            .invalidate(&relationship_key(relationship, name))
    }

    /// Drop every cached link of `relationship`.
    pub fn invalidate_relationship(&self, relationship: &str) {
        self.inner
            .relationship_link_cache
            .invalidate_prefix(&format!("{}/", relationship));
    }

    pub fn invalidate_relationship_links(&self) {
        self.inner.relationship_link_cache.invalidate_all();
    }

    /// Tie a fetched resource back to the client record whose save created
    /// this one.
    ///
    /// Only applies when the fetched resource has a different type than this
    /// record and the same type as the pending related record. With a `prop`
    /// the related record's relationship is pointed at the fetched resource;
    /// without one the related record is flagged persisted and becomes the
    /// response data.
    fn resolve_pending(&self, response: Response) -> Response {
        let Some(pending) = self.pending_create() else {
            return response;
        };
        let Some(fetched) = response.record() else {
            return response;
        };

        if fetched.type_name() == self.type_name()
            || fetched.type_name() != pending.related.type_name()
        {
            return response;
        }

        match pending.prop {
            Some(prop) => {
                pending.related.set_related(prop, &fetched);
                response
            }
            None => {
                pending.related.set_persisted(true);
                response.replace_data(pending.related)
            }
        }
    }
}

/// The request behind a cached link entry.
///
/// Holds the store weakly: the entry lives inside a record the store owns.
/// A store dropped before the request starts yields an empty response.
pub(crate) async fn follow(
    store: WeakStore,
    link: Option<Link>,
    options: Option<RequestOptions>,
) -> Response {
    let Some(store) = store.upgrade() else {
        return Response::detached(RawResponse::default());
    };
    let headers = options.as_ref().and_then(|o| o.headers.clone());
    network::fetch_link(link.as_ref(), &store, headers.as_ref(), options.as_ref()).await
}

fn relationship_key(relationship: &str, name: &str) -> String {
    format!("{}/{}", relationship, name)
}
