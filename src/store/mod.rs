//! Store - the identity-mapped record registry and its network front door.
//!
//! The store owns the configuration, the registered model types and a
//! [`Collection`]. Incoming JSON:API documents are flattened and synced into
//! the collection so that one `(type, id)` always maps to one [`Record`].
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_store::{Config, ModelType, RequestOptions, Store};
//!
//! let store = Store::new(Config::new().with_base_url("https://api.example.com/"))
//!     .with_type(ModelType::new("event").with_ref("organizer", "user"));
//!
//! let options = RequestOptions::new().include("organizer");
//! let events = store.fetch_all("event", Some(&options)).await.into_result()?;
//! for event in events.records() {
//!     println!("{:?}", event.get("name"));
//! }
//! ```

mod change;
mod collection;
mod in_memory;
mod registry;

pub use change::{ChangeKind, StoreChange, CHANGE_EVENT};
pub use collection::Collection;
pub use in_memory::InMemoryCollection;
pub use registry::ModelType;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
#[cfg(feature = "emitter")]
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::flatten::{flatten_record, INTERNAL_KEY};
use crate::jsonapi::{Document, Id, ResourceObject};
use crate::network::{self, Method};
use crate::query::{self, PreparedQuery, RequestOptions};
use crate::record::{Record, Ref};
use crate::response::{Response, ResponseData};
use crate::utils::{map_items, OneOrMany};

struct StoreInner {
    config: Arc<Config>,
    types: RwLock<BTreeMap<String, ModelType>>,
    collection: Arc<dyn Collection>,
    #[cfg(feature = "emitter")]
    emitter: Mutex<EventEmitter>,
}

// Cached link responses hold the records they yield, and those can be the
// records that own the cache. Clear them so neither side outlives the store.
impl Drop for StoreInner {
    fn drop(&mut self) {
        match self.collection.all() {
            Ok(records) => {
                for record in records {
                    record.invalidate_links();
                    record.invalidate_relationship_links();
                }
            }
            Err(e) => warn!(error = %e, "could not clear link caches on store drop"),
        }
    }
}

/// Shared handle to a store. Clones point at the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Non-owning handle held by records and responses.
#[derive(Clone, Default)]
pub struct WeakStore(Weak<StoreInner>);

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.0.upgrade().map(|inner| Store { inner })
    }
}

impl Store {
    /// A store over a fresh [`InMemoryCollection`].
    pub fn new(config: Config) -> Self {
        Self::with_collection(config, Arc::new(InMemoryCollection::new()))
    }

    pub fn with_collection(config: Config, collection: Arc<dyn Collection>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config: Arc::new(config),
                types: RwLock::new(BTreeMap::new()),
                collection,
                #[cfg(feature = "emitter")]
                emitter: Mutex::new(EventEmitter::new()),
            }),
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.inner))
    }

    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.inner.collection
    }

    // Registry

    /// Register a model type, replacing any earlier one with the same name.
    pub fn register(&self, model: ModelType) {
        self.inner
            .types
            .write()
            .insert(model.type_name.clone(), model);
    }

    pub fn with_type(self, model: ModelType) -> Self {
        self.register(model);
        self
    }

    pub fn types(&self) -> Vec<ModelType> {
        self.inner.types.read().values().cloned().collect()
    }

    pub fn model_type(&self, type_name: &str) -> Option<ModelType> {
        self.inner.types.read().get(type_name).cloned()
    }

    // Identity map

    pub fn find(&self, type_name: &str, id: &Id) -> Result<Option<Record>> {
        Ok(self.inner.collection.find(type_name, id)?)
    }

    pub fn find_all(&self, type_name: &str) -> Result<Vec<Record>> {
        Ok(self.inner.collection.find_all(type_name)?)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.collection.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.collection.is_empty()?)
    }

    /// Add a new client-side record.
    ///
    /// The id is taken from `attributes` or generated. Attributes named
    /// after a declared ref (`name` or `nameId`) become the ref's ids. The
    /// record is not persisted until saved.
    pub fn add(&self, type_name: &str, attributes: Value) -> Result<Record> {
        let mut attributes = match attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id = attributes
            .remove("id")
            .as_ref()
            .and_then(Id::from_value)
            .unwrap_or_else(Id::generate);
        attributes.remove("type");
        attributes.remove(INTERNAL_KEY);

        let mut refs = BTreeMap::new();
        if let Some(model) = self.model_type(type_name) {
            for (name, related_type) in &model.refs {
                let value = attributes
                    .remove(&format!("{}Id", name))
                    .or_else(|| attributes.remove(name.as_str()));
                if let Some(value) = value {
                    refs.insert(name.clone(), Ref::new(related_type.clone(), ids_from_value(&value)));
                }
            }
        }

        let record = Record::from_parts(
            self.downgrade(),
            id,
            type_name.to_string(),
            attributes,
            Default::default(),
            refs,
        );
        self.insert(record.clone())?;
        Ok(record)
    }

    fn insert(&self, record: Record) -> Result<()> {
        let kind = match self.inner.collection.insert(record.clone())? {
            Some(_) => ChangeKind::Updated,
            None => ChangeKind::Added,
        };
        self.emit(StoreChange::new(kind, record.type_name(), record.id()));
        Ok(())
    }

    /// Remove a record from the collection only. No request is made.
    pub fn remove_local(&self, type_name: &str, id: &Id) -> Result<Option<Record>> {
        let removed = self.inner.collection.remove(type_name, id)?;
        if let Some(record) = &removed {
            record.invalidate_links();
            record.invalidate_relationship_links();
            trace!(type_name, %id, "record removed from store");
            self.emit(StoreChange::new(ChangeKind::Removed, type_name, id));
        }
        Ok(removed)
    }

    // Sync

    /// Sync a raw JSON:API document into the store.
    pub fn sync(&self, body: &Value) -> Result<ResponseData> {
        let document: Document = serde_json::from_value(body.clone())?;
        self.sync_document(&document)
    }

    /// Sync `included` and then `data`; returns the records for `data`.
    pub fn sync_document(&self, document: &Document) -> Result<ResponseData> {
        for resource in document.included.iter().flatten() {
            self.sync_resource(resource)?;
        }

        Ok(match &document.data {
            None => ResponseData::Empty,
            Some(OneOrMany::One(resource)) => ResponseData::One(self.sync_resource(resource)?),
            Some(OneOrMany::Many(resources)) => ResponseData::Many(
                resources
                    .iter()
                    .map(|resource| self.sync_resource(resource))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// Insert or update a single resource.
    ///
    /// A resource with a server id is persisted. An existing record with the
    /// same identity is updated in place so every handle sees the change.
    pub fn sync_resource(&self, resource: &ResourceObject) -> Result<Record> {
        let mut flat = flatten_record(resource);
        let refs = self.relationship_refs(resource);

        let id = match flat.id.take() {
            Some(id) => {
                flat.internal.persisted = Some(true);
                id
            }
            None => Id::generate(),
        };

        if let Some(existing) = self.inner.collection.find(&flat.type_name, &id)? {
            existing.apply(flat, refs);
            self.emit(StoreChange::new(ChangeKind::Updated, existing.type_name(), &id));
            return Ok(existing);
        }

        let record = Record::from_parts(
            self.downgrade(),
            id,
            flat.type_name,
            flat.attributes,
            flat.internal,
            refs,
        );
        self.insert(record.clone())?;
        Ok(record)
    }

    /// Refs carried by a resource's relationship `data`.
    fn relationship_refs(&self, resource: &ResourceObject) -> BTreeMap<String, Ref> {
        let model = self.model_type(&resource.type_name);
        let mut refs = BTreeMap::new();

        for (name, relationship) in resource.relationships.iter().flatten() {
            let Some(data) = &relationship.data else {
                continue;
            };
            let declared = model.as_ref().and_then(|m| m.refs.get(name)).cloned();
            let reference = match data {
                Some(identifiers) => {
                    let type_name = identifiers
                        .iter()
                        .next()
                        .map(|identifier| identifier.type_name.clone())
                        .or(declared)
                        .unwrap_or_else(|| name.clone());
                    Ref::new(type_name, Some(map_items(identifiers, |i| i.id.clone())))
                }
                None => Ref::new(declared.unwrap_or_else(|| name.clone()), None),
            };
            refs.insert(name.clone(), reference);
        }

        refs
    }

    // Network

    /// Build the URL, body and headers for a request against `type_name`.
    pub fn prepare_query(
        &self,
        type_name: &str,
        id: Option<&Id>,
        data: Option<Value>,
        options: Option<&RequestOptions>,
    ) -> PreparedQuery {
        let model = self.model_type(type_name);
        query::prepare_query(&self.inner.config, model.as_ref(), type_name, id, data, options)
    }

    /// GET a single record.
    pub async fn fetch(
        &self,
        type_name: &str,
        id: impl Into<Id>,
        options: Option<&RequestOptions>,
    ) -> Response {
        let id = id.into();
        let query = self.prepare_query(type_name, Some(&id), None, options);
        debug!(type_name, %id, url = %query.url, "fetching record");
        network::read(self, &query.url, Some(&query.headers), options).await
    }

    /// GET every record of a type matching `options`.
    pub async fn fetch_all(&self, type_name: &str, options: Option<&RequestOptions>) -> Response {
        let query = self.prepare_query(type_name, None, None, options);
        debug!(type_name, url = %query.url, "fetching records");
        network::read(self, &query.url, Some(&query.headers), options).await
    }

    /// Arbitrary request to `path` under the configured base URL.
    ///
    /// Query options are appended the same way as for typed fetches.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        data: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Response {
        let query = query::prepare_query(&self.inner.config, None, path, None, None, options);
        network::fetch(self, method, &query.url, data, options).await
    }

    /// Remove a record by identity: a DELETE for persisted records, a local
    /// removal otherwise.
    pub async fn remove_record(
        &self,
        type_name: &str,
        id: impl Into<Id>,
        options: Option<&RequestOptions>,
    ) -> Result<bool> {
        let id = id.into();
        let record = self
            .find(type_name, &id)?
            .ok_or_else(|| StoreError::NotFound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            })?;
        record.remove(options).await
    }

    // Change notifications

    #[cfg(feature = "emitter")]
    fn emit(&self, change: StoreChange) {
        trace!(?change, "store change");
        self.inner.emitter.lock().emit(CHANGE_EVENT, change);
    }

    #[cfg(not(feature = "emitter"))]
    fn emit(&self, change: StoreChange) {
        trace!(?change, "store change");
    }

    /// Listen for records being added, updated or removed.
    ///
    /// Listeners run on the emitter's own threads. Returns an id for
    /// [`remove_change_listener`](Self::remove_change_listener).
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, listener: F) -> String
    where
        F: Fn(StoreChange) + Send + Sync + 'static,
    {
        self.inner.emitter.lock().on(CHANGE_EVENT, listener)
    }

    #[cfg(feature = "emitter")]
    pub fn remove_change_listener(&self, id: &str) -> bool {
        self.inner.emitter.lock().remove_listener(id).is_some()
    }
}

fn ids_from_value(value: &Value) -> Option<OneOrMany<Id>> {
    match value {
        Value::Array(items) => Some(OneOrMany::Many(
            items.iter().filter_map(Id::from_value).collect(),
        )),
        other => Id::from_value(other).map(OneOrMany::One),
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.inner.config)
            .field("types", &self.inner.types.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
