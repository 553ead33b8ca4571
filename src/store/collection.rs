//! Collection - the identity map behind a store.

use crate::error::StoreError;
use crate::jsonapi::Id;
use crate::record::Record;

/// Identity-mapped storage of records, keyed by `(type, id)`.
///
/// The store only reaches records through this trait, so an application
/// can plug in its own reactive or persistent collection.
pub trait Collection: Send + Sync {
    /// Get a record by type and id. Returns None if not found.
    fn find(&self, type_name: &str, id: &Id) -> Result<Option<Record>, StoreError>;

    /// All records of a type, in insertion order.
    fn find_all(&self, type_name: &str) -> Result<Vec<Record>, StoreError>;

    /// Every record, across all types, in insertion order.
    fn all(&self) -> Result<Vec<Record>, StoreError>;

    /// Insert a record, returning the one it replaced, if any.
    fn insert(&self, record: Record) -> Result<Option<Record>, StoreError>;

    /// Remove a record by type and id. Returns the removed record.
    fn remove(&self, type_name: &str, id: &Id) -> Result<Option<Record>, StoreError>;

    /// Number of records across all types.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
