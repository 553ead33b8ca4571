//! Small helpers shared by the flattening, query and transport layers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A value that is either a single item or a list of items.
///
/// JSON:API uses this shape for to-one vs to-many relationship data and for
/// the top-level `data` member of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Apply `f` to the single item, or to every item preserving order.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> OneOrMany<U> {
        match self {
            OneOrMany::One(item) => OneOrMany::One(f(item)),
            OneOrMany::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}

impl OneOrMany<String> {
    /// Comma-joined form used by `sort`, `include` and `fields` parameters.
    pub fn join(&self) -> String {
        match self {
            OneOrMany::One(item) => item.clone(),
            OneOrMany::Many(items) => items.join(","),
        }
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(value: Vec<String>) -> Self {
        OneOrMany::Many(value)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(value: Vec<&str>) -> Self {
        OneOrMany::Many(value.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(value: [&str; N]) -> Self {
        OneOrMany::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Map a single item or a list of items through `f`.
pub fn map_items<T, U, F>(data: &OneOrMany<T>, mut f: F) -> OneOrMany<U>
where
    F: FnMut(&T) -> U,
{
    match data {
        OneOrMany::One(item) => OneOrMany::One(f(item)),
        OneOrMany::Many(items) => OneOrMany::Many(items.iter().map(f).collect()),
    }
}

/// Call `f` for every key of a JSON object, in insertion order.
///
/// A missing object is treated as empty.
pub fn object_for_each<F>(obj: Option<&Map<String, Value>>, mut f: F)
where
    F: FnMut(&str, &Value),
{
    if let Some(obj) = obj {
        for (key, value) in obj {
            f(key, value);
        }
    }
}

/// Shallow-merge `sources` into `target`; later sources win key by key.
///
/// `None` sources are skipped.
pub fn assign<'a, K, V, I>(target: &mut BTreeMap<K, V>, sources: I)
where
    K: Ord + Clone + 'a,
    V: Clone + 'a,
    I: IntoIterator<Item = Option<&'a BTreeMap<K, V>>>,
{
    for source in sources.into_iter().flatten() {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// JavaScript-style truthiness, used to drop empty links and meta entries.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
