//! Saving and removing records over the network.

use serde_json::{json, Value};
use tracing::debug;

use super::Record;
use crate::error::{Error, Result};
use crate::jsonapi::Link;
use crate::network;
use crate::query::RequestOptions;

impl Record {
    /// Create or update the record on the server.
    ///
    /// Unpersisted records are POSTed to the collection URL, persisted ones
    /// PATCHed at their own URL. A 201 returns the created record, any other
    /// success returns this record flagged persisted.
    pub async fn save(&self, options: Option<&RequestOptions>) -> Result<Record> {
        let store = self.store()?;
        let body = json!({ "data": serde_json::to_value(self.to_jsonapi())? });
        let url = self.url();
        let headers = options.and_then(RequestOptions::headers);

        let response = if self.is_persisted() {
            debug!(type_name = self.type_name(), id = %self.id(), "updating record");
            network::update(&store, &url, &body, headers, options).await
        } else {
            debug!(type_name = self.type_name(), id = %self.id(), "creating record");
            network::create(&store, &url, &body, headers, options).await
        };

        network::handle_response(self, None, response)
    }

    /// Replace the server-side linkage of one relationship.
    ///
    /// Needs a `self` link on the relationship; fails with
    /// [`Error::MissingRelationshipLink`] before any request otherwise.
    pub async fn save_relationship(
        &self,
        relationship: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Record> {
        let href = self
            .relationship_link(relationship, "self")
            .as_ref()
            .and_then(Link::href)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingRelationshipLink {
                relationship: relationship.to_string(),
            })?;

        let reference = self
            .refs()
            .remove(relationship)
            .ok_or_else(|| Error::UnknownRelationship(relationship.to_string()))?;
        let store = self.store()?;

        let data = match reference.to_identifiers() {
            Some(identifiers) => serde_json::to_value(identifiers)?,
            None => Value::Null,
        };
        let body = json!({ "data": data });
        let headers = options.and_then(RequestOptions::headers);

        debug!(type_name = self.type_name(), id = %self.id(), relationship, "saving relationship");
        let response = network::update(&store, &href, &body, headers, options).await;

        network::handle_response(self, Some(relationship), response)
    }

    /// Delete the record from the server and the store.
    ///
    /// An unpersisted record is only removed locally and no request is made.
    /// A server error is returned before any local state changes.
    pub async fn remove(&self, options: Option<&RequestOptions>) -> Result<bool> {
        if !self.is_persisted() {
            if let Some(store) = self.inner.store.upgrade() {
                store.remove_local(self.type_name(), self.id())?;
            }
            return Ok(true);
        }

        let store = self.store()?;
        let url = self.url();
        let headers = options.and_then(RequestOptions::headers);

        let response = network::remove(&store, &url, headers, options).await;
        if let Some(error) = response.error() {
            return Err(Error::Network(error.clone()));
        }

        self.set_persisted(false);
        store.remove_local(self.type_name(), self.id())?;
        Ok(true)
    }
}
