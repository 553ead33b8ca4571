//! Change notifications emitted by the store.

use serde::{Deserialize, Serialize};

/// Event name used on the store's emitter.
pub const CHANGE_EVENT: &str = "change";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// A record entered, changed in, or left the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub type_name: String,
    pub id: String,
}

impl StoreChange {
    pub fn new(kind: ChangeKind, type_name: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            id: id.to_string(),
        }
    }
}
