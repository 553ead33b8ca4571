//! Registered model types.

use std::collections::BTreeMap;

/// Description of a record type known to the store.
///
/// ## Example
///
/// ```ignore
/// let event = ModelType::new("event")
///     .with_endpoint("events")
///     .with_ref("organizer", "user")
///     .with_ref("tags", "tag");
/// store.register(event);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelType {
    pub type_name: String,
    /// Path used when a record has no `self` link.
    pub endpoint: Option<String>,
    /// Older name for `endpoint`; only consulted when `endpoint` is unset.
    pub base_url: Option<String>,
    /// Relationship name to related type.
    pub refs: BTreeMap<String, String>,
    /// Send client-generated ids when creating records.
    pub use_autogenerated_ids: bool,
}

impl ModelType {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_ref(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.refs.insert(name.into(), type_name.into());
        self
    }

    pub fn with_autogenerated_ids(mut self, enabled: bool) -> Self {
        self.use_autogenerated_ids = enabled;
        self
    }

    /// Request path: `endpoint`, then `base_url`, then the type name.
    pub fn path(&self) -> &str {
        self.endpoint
            .as_deref()
            .or(self.base_url.as_deref())
            .unwrap_or(&self.type_name)
    }
}
