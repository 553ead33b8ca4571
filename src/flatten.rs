//! Flattening of JSON:API resource objects into store-ready records.
//!
//! A flattened record is a flat attribute bag keyed next to `id` and `type`,
//! plus a single reserved `__internal` entry carrying relationship links,
//! resource links, meta, and the persisted flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jsonapi::{Id, Link, Links, Relationship, ResourceObject};
use crate::utils::{is_truthy, object_for_each};

/// Key under which internal metadata is exposed in the flat form.
pub const INTERNAL_KEY: &str = "__internal";

const RESERVED_KEYS: [&str; 3] = ["id", "type", INTERNAL_KEY];

/// Sidecar metadata kept next to a record's attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Internal {
    /// Relationship name to its links (`self`, `related`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, Links>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
}

/// The flat, store-ready form of a resource object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlattenedRecord {
    pub id: Option<Id>,
    pub type_name: String,
    pub attributes: Map<String, Value>,
    pub internal: Internal,
}

impl FlattenedRecord {
    /// The flat JSON map: `id`, `type`, every attribute, and `__internal`.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(
            "id".into(),
            self.id.as_ref().map(Id::to_value).unwrap_or(Value::Null),
        );
        out.insert("type".into(), Value::String(self.type_name.clone()));
        for (key, value) in &self.attributes {
            out.insert(key.clone(), value.clone());
        }
        out.insert(
            INTERNAL_KEY.into(),
            serde_json::to_value(&self.internal).unwrap_or(Value::Null),
        );
        Value::Object(out)
    }

    /// Rebuild a resource object carrying the same attributes, links,
    /// relationship links and meta.
    pub fn to_resource(&self) -> ResourceObject {
        let relationships = self.internal.relationships.as_ref().map(|rels| {
            rels.iter()
                .map(|(name, links)| {
                    (
                        name.clone(),
                        Relationship {
                            data: None,
                            links: Some(links.clone()),
                            meta: None,
                        },
                    )
                })
                .collect()
        });

        ResourceObject {
            id: self.id.clone(),
            type_name: self.type_name.clone(),
            attributes: self.attributes.clone(),
            relationships,
            links: self.internal.links.as_ref().map(|links| {
                links
                    .iter()
                    .map(|(name, link)| (name.clone(), Some(link.clone())))
                    .collect()
            }),
            meta: self.internal.meta.clone(),
        }
    }
}

fn link_is_truthy(link: &Link) -> bool {
    match link {
        Link::Url(url) => !url.is_empty(),
        Link::Object { .. } => true,
    }
}

/// Flatten one resource object. Pure: no store access, no side effects.
///
/// Attributes named `id`, `type` or `__internal` are shadowed by the
/// resource's own identity and dropped. Relationships without `links` are
/// skipped here; their `data` is applied by the store.
pub fn flatten_record(resource: &ResourceObject) -> FlattenedRecord {
    let mut data = FlattenedRecord {
        id: resource.id.clone(),
        type_name: resource.type_name.clone(),
        attributes: Map::new(),
        internal: Internal::default(),
    };

    object_for_each(Some(&resource.attributes), |key, value| {
        if RESERVED_KEYS.contains(&key) {
            tracing::trace!(key, type_name = %resource.type_name, "reserved attribute shadowed");
            return;
        }
        data.attributes.insert(key.to_string(), value.clone());
    });

    if let Some(relationships) = &resource.relationships {
        for (name, relationship) in relationships {
            if let Some(links) = &relationship.links {
                data.internal
                    .relationships
                    .get_or_insert_with(BTreeMap::new)
                    .insert(name.clone(), links.clone());
            }
        }
    }

    if let Some(links) = &resource.links {
        for (name, link) in links {
            if let Some(link) = link.as_ref().filter(|link| link_is_truthy(link)) {
                data.internal
                    .links
                    .get_or_insert_with(BTreeMap::new)
                    .insert(name.clone(), link.clone());
            }
        }
    }

    object_for_each(resource.meta.as_ref(), |key, value| {
        if is_truthy(value) {
            data.internal
                .meta
                .get_or_insert_with(Map::new)
                .insert(key.to_string(), value.clone());
        }
    });

    data
}
