//! Request options: headers, filters, sorting, includes, sparse fieldsets
//! and raw parameters.

use std::collections::BTreeMap;

use crate::config::Headers;
use crate::utils::OneOrMany;

/// A filter leaf or a nested filter group.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Value(String),
    /// Emitted as a single comma-joined value.
    List(Vec<String>),
    /// Nested keys extend the dotted path (`filter[a.b]`).
    Nested(Filters),
}

impl FilterValue {
    pub fn value(value: impl ToString) -> Self {
        FilterValue::Value(value.to_string())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        FilterValue::List(items.into_iter().map(|item| item.to_string()).collect())
    }

    pub fn nested<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        FilterValue::Nested(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Value(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Value(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Value(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Value(value.to_string())
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::list(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl From<Filters> for FilterValue {
    fn from(value: Filters) -> Self {
        FilterValue::Nested(value)
    }
}

/// Filter tree. Key-sorted so equal option sets always build equal URLs.
pub type Filters = BTreeMap<String, FilterValue>;

/// A caller-supplied query parameter, appended after everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    KeyValue { key: String, value: String },
    Raw(String),
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Param::KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn raw(param: impl Into<String>) -> Self {
        Param::Raw(param.into())
    }

    pub fn to_query(&self) -> String {
        match self {
            Param::KeyValue { key, value } => format!("{}={}", key, value),
            Param::Raw(raw) => raw.clone(),
        }
    }
}

/// Per-request options.
///
/// ## Example
///
/// ```ignore
/// let options = RequestOptions::new()
///     .filter("status", "open")
///     .sort(["-created", "name"])
///     .include("organizer");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Option<Headers>,
    pub include: Option<OneOrMany<String>>,
    pub filter: Option<Filters>,
    pub sort: Option<OneOrMany<String>>,
    /// Sparse fieldsets: type name to field list.
    pub fields: Option<BTreeMap<String, OneOrMany<String>>>,
    pub params: Vec<Param>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn include(mut self, include: impl Into<OneOrMany<String>>) -> Self {
        self.include = Some(include.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<OneOrMany<String>>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter
            .get_or_insert_with(Filters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn fields(mut self, type_name: impl Into<String>, fields: impl Into<OneOrMany<String>>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(type_name.into(), fields.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }
}
