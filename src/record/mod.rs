//! Record - a store-managed JSON:API resource.
//!
//! A record is a shared handle: clones point at the same state, and the
//! identity map hands out the same handle for the same `(type, id)`.
//! Attributes, internal metadata and relationship refs live behind a lock;
//! identity (`type`, `id`) is fixed at construction.

mod cache;
mod links;
mod persistence;

pub use cache::{LinkCache, SharedResponse};
pub(crate) use links::follow as follow_link;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::flatten::{FlattenedRecord, Internal};
use crate::jsonapi::{Id, Identifier, Link, Links, Relationship, ResourceObject};
use crate::store::{Store, WeakStore};
use crate::utils::{map_items, OneOrMany};

/// A relationship reference: the related type and the related id(s).
///
/// `ids == None` is an explicit empty to-one relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Ref {
    pub type_name: String,
    pub ids: Option<OneOrMany<Id>>,
}

impl Ref {
    pub fn new(type_name: impl Into<String>, ids: Option<OneOrMany<Id>>) -> Self {
        Self {
            type_name: type_name.into(),
            ids,
        }
    }

    pub fn one(type_name: impl Into<String>, id: impl Into<Id>) -> Self {
        Self::new(type_name, Some(OneOrMany::One(id.into())))
    }

    pub fn many<I, T>(type_name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        Self::new(
            type_name,
            Some(OneOrMany::Many(ids.into_iter().map(Into::into).collect())),
        )
    }

    /// The relationship `data` member for this ref.
    pub fn to_identifiers(&self) -> Option<OneOrMany<Identifier>> {
        self.ids
            .as_ref()
            .map(|ids| map_items(ids, |id| Identifier::new(self.type_name.clone(), id.clone())))
    }
}

/// Context left on a record created by a 201 response.
///
/// `related` is the client record whose save produced the creation; `prop`
/// is the relationship name when the creation came from `save_relationship`.
#[derive(Debug, Clone)]
pub struct PendingCreate {
    pub related: Record,
    pub prop: Option<String>,
}

#[derive(Default)]
struct RecordState {
    attributes: Map<String, Value>,
    internal: Internal,
    refs: BTreeMap<String, Ref>,
    pending: Option<PendingCreate>,
}

struct RecordInner {
    id: Id,
    type_name: String,
    state: RwLock<RecordState>,
    store: WeakStore,
    link_cache: LinkCache,
    relationship_link_cache: LinkCache,
}

#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordInner>,
}

impl Record {
    /// A record that belongs to no store. Network operations on it fail with
    /// [`Error::Detached`].
    pub fn new(type_name: impl Into<String>, id: impl Into<Id>, attributes: Map<String, Value>) -> Self {
        Self::from_parts(
            WeakStore::default(),
            id.into(),
            type_name.into(),
            attributes,
            Internal::default(),
            BTreeMap::new(),
        )
    }

    pub(crate) fn from_parts(
        store: WeakStore,
        id: Id,
        type_name: String,
        attributes: Map<String, Value>,
        internal: Internal,
        refs: BTreeMap<String, Ref>,
    ) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                id,
                type_name,
                state: RwLock::new(RecordState {
                    attributes,
                    internal,
                    refs,
                    pending: None,
                }),
                store,
                link_cache: LinkCache::new(),
                relationship_link_cache: LinkCache::new(),
            }),
        }
    }

    /// A detached record built from a flattened resource.
    pub(crate) fn from_flattened(flat: FlattenedRecord) -> Self {
        let id = flat.id.unwrap_or_else(Id::generate);
        Self::from_parts(
            WeakStore::default(),
            id,
            flat.type_name,
            flat.attributes,
            flat.internal,
            BTreeMap::new(),
        )
    }

    pub fn id(&self) -> &Id {
        &self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// True if both handles point at the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The owning store, if it is still alive.
    pub fn store(&self) -> Result<Store> {
        self.inner.store.upgrade().ok_or_else(|| {
            Error::Detached(format!("record {}:{}", self.inner.type_name, self.inner.id))
        })
    }

    // Attributes

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.read().attributes.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .state
            .write()
            .attributes
            .insert(key.into(), value.into());
    }

    /// Shallow-merge `attributes` over the current ones.
    pub fn assign(&self, attributes: Map<String, Value>) {
        let mut state = self.inner.state.write();
        for (key, value) in attributes {
            state.attributes.insert(key, value);
        }
    }

    pub fn attributes(&self) -> Map<String, Value> {
        self.inner.state.read().attributes.clone()
    }

    /// The flat form: `id`, `type`, attributes and `__internal`.
    pub fn to_value(&self) -> Value {
        let state = self.inner.state.read();
        FlattenedRecord {
            id: Some(self.inner.id.clone()),
            type_name: self.inner.type_name.clone(),
            attributes: state.attributes.clone(),
            internal: state.internal.clone(),
        }
        .to_value()
    }

    // Relationship refs

    pub fn refs(&self) -> BTreeMap<String, Ref> {
        self.inner.state.read().refs.clone()
    }

    pub fn ref_ids(&self, name: &str) -> Option<OneOrMany<Id>> {
        self.inner
            .state
            .read()
            .refs
            .get(name)
            .and_then(|r| r.ids.clone())
    }

    pub fn set_ref(&self, name: impl Into<String>, reference: Ref) {
        self.inner.state.write().refs.insert(name.into(), reference);
    }

    /// Point the to-one relationship `name` at `record`.
    pub fn set_related(&self, name: impl Into<String>, record: &Record) {
        self.set_ref(name, Ref::one(record.type_name(), record.id().clone()));
    }

    /// Resolve the relationship `name` through the store's identity map.
    ///
    /// Ids the store does not know are skipped.
    pub fn related(&self, name: &str) -> Result<Vec<Record>> {
        let reference = self
            .inner
            .state
            .read()
            .refs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownRelationship(name.to_string()))?;
        let store = self.store()?;

        let mut records = Vec::new();
        for id in reference.ids.iter().flat_map(OneOrMany::iter) {
            if let Some(record) = store.find(&reference.type_name, id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    // Internal metadata

    pub fn links(&self) -> BTreeMap<String, Link> {
        self.inner
            .state
            .read()
            .internal
            .links
            .clone()
            .unwrap_or_default()
    }

    pub fn link(&self, name: &str) -> Option<Link> {
        self.inner
            .state
            .read()
            .internal
            .links
            .as_ref()
            .and_then(|links| links.get(name).cloned())
    }

    pub fn meta(&self) -> Option<Map<String, Value>> {
        self.inner.state.read().internal.meta.clone()
    }

    pub fn relationship_links(&self, relationship: &str) -> Option<Links> {
        self.inner
            .state
            .read()
            .internal
            .relationships
            .as_ref()
            .and_then(|rels| rels.get(relationship).cloned())
    }

    pub fn relationship_link(&self, relationship: &str, name: &str) -> Option<Link> {
        self.relationship_links(relationship)
            .and_then(|mut links| links.remove(name))
            .flatten()
    }

    pub fn is_persisted(&self) -> bool {
        self.inner.state.read().internal.persisted.unwrap_or(false)
    }

    pub fn set_persisted(&self, persisted: bool) {
        self.inner.state.write().internal.persisted = Some(persisted);
    }

    pub fn pending_create(&self) -> Option<PendingCreate> {
        self.inner.state.read().pending.clone()
    }

    pub fn set_pending_create(&self, pending: Option<PendingCreate>) {
        self.inner.state.write().pending = pending;
    }

    /// Merge a freshly flattened copy of this resource into the record.
    ///
    /// Attributes are shallow-merged. Links, relationship links and meta are
    /// replaced when `flat` carries them and kept otherwise; so is the
    /// persisted flag.
    pub(crate) fn apply(&self, flat: FlattenedRecord, refs: BTreeMap<String, Ref>) {
        let mut state = self.inner.state.write();
        for (key, value) in flat.attributes {
            state.attributes.insert(key, value);
        }

        let internal = &mut state.internal;
        if flat.internal.relationships.is_some() {
            internal.relationships = flat.internal.relationships;
        }
        if flat.internal.links.is_some() {
            internal.links = flat.internal.links;
        }
        if flat.internal.meta.is_some() {
            internal.meta = flat.internal.meta;
        }
        if flat.internal.persisted.is_some() {
            internal.persisted = flat.internal.persisted;
        }

        state.refs.extend(refs);
    }

    /// Serialize into a JSON:API resource object for a create or update.
    ///
    /// The id is sent only for persisted records, or when the model type
    /// uses client-generated ids. Relationships are rebuilt from refs, and
    /// the ref attributes (`name`, `nameId`, `nameMeta`) are removed.
    pub fn to_jsonapi(&self) -> ResourceObject {
        let model = self
            .inner
            .store
            .upgrade()
            .and_then(|store| store.model_type(&self.inner.type_name));
        let state = self.inner.state.read();

        let send_id = state.internal.persisted.unwrap_or(false)
            || model.as_ref().is_some_and(|m| m.use_autogenerated_ids);

        let mut attributes = state.attributes.clone();
        let mut relationships: Option<BTreeMap<String, Relationship>> = None;

        let declared = model.iter().flat_map(|m| m.refs.keys());
        for name in state.refs.keys().chain(declared) {
            attributes.remove(name);
            attributes.remove(&format!("{}Id", name));
            attributes.remove(&format!("{}Meta", name));
        }

        for (name, reference) in &state.refs {
            relationships.get_or_insert_with(BTreeMap::new).insert(
                name.clone(),
                Relationship {
                    data: Some(reference.to_identifiers()),
                    links: None,
                    meta: None,
                },
            );
        }

        ResourceObject {
            id: send_id.then(|| self.inner.id.clone()),
            type_name: self.inner.type_name.clone(),
            attributes,
            relationships,
            links: None,
            meta: None,
        }
    }

    /// The URL for operations on this record.
    ///
    /// A `self` link wins and is used as-is. Otherwise the registered model
    /// path (or the type name) under the configured base URL, plus the id
    /// once the record is persisted.
    pub fn url(&self) -> String {
        if let Some(href) = self.link("self").as_ref().and_then(Link::href) {
            return href.to_string();
        }

        let store = self.inner.store.upgrade();
        let path = store
            .as_ref()
            .and_then(|store| store.model_type(&self.inner.type_name))
            .map(|model| model.path().to_string())
            .unwrap_or_else(|| self.inner.type_name.clone());
        let base_url = store
            .as_ref()
            .map(|store| store.config().base_url.clone())
            .unwrap_or_default();

        if self.is_persisted() {
            format!("{}{}/{}", base_url, path, self.inner.id)
        } else {
            format!("{}{}", base_url, path)
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Record")
            .field("type", &self.inner.type_name)
            .field("id", &self.inner.id)
            .field("attributes", &state.attributes)
            .field("persisted", &state.internal.persisted.unwrap_or(false))
            .finish_non_exhaustive()
    }
}
