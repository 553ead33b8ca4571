//! JSON:API wire format.
//!
//! Only the subset this crate reads and writes is modelled: resource objects,
//! resource identifiers, relationships, links, and the top-level document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::OneOrMany;

/// A record id. JSON:API mandates strings, but many servers send numbers.
///
/// Numbers that do not fit an `i64` (fractions, values past `i64::MAX`) are
/// kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Str(String),
}

impl Id {
    /// A fresh client-side id for records that have not been persisted.
    pub fn generate() -> Self {
        Id::Str(uuid::Uuid::new_v4().to_string())
    }

    /// Parse an id out of a loose JSON value (string or number).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Id::Str(s.clone())),
            Value::Number(n) => Some(n.as_i64().map_or_else(|| Id::Str(n.to_string()), Id::Num)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Id::Num(n) => Value::from(*n),
            Id::Str(s) => Value::from(s.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Id::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", value)))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{}", n),
            Id::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Num(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Num(value as i64)
    }
}

/// `(type, id)` pair naming a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub id: Id,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Identifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            meta: None,
        }
    }
}

/// A link: either a bare URL or an object with `href` and optional `meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Url(String),
    Object {
        #[serde(default)]
        href: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Map<String, Value>>,
    },
}

impl Link {
    /// The URL this link points at; `None` when empty or missing.
    pub fn href(&self) -> Option<&str> {
        match self {
            Link::Url(url) if !url.is_empty() => Some(url),
            Link::Object {
                href: Some(href), ..
            } if !href.is_empty() => Some(href),
            _ => None,
        }
    }
}

impl From<&str> for Link {
    fn from(value: &str) -> Self {
        Link::Url(value.to_string())
    }
}

/// Named links of a resource, relationship or document. Entries may be `null`.
pub type Links = BTreeMap<String, Option<Link>>;

/// Relationship data: `None` for an explicit `null` to-one relationship.
pub type RelationshipData = Option<OneOrMany<Identifier>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Relationship {
    /// Outer `None` means the member was absent; `Some(None)` means `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub data: Option<RelationshipData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<RelationshipData>, D::Error>
where
    D: Deserializer<'de>,
{
    RelationshipData::deserialize(deserializer).map(Some)
}

/// A single JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, Relationship>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// A top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OneOrMany<ResourceObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}
