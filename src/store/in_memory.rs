//! InMemoryCollection - HashMap-backed identity map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::collection::Collection;
use crate::error::StoreError;
use crate::jsonapi::Id;
use crate::record::Record;

/// Internal stored representation of a record.
struct StoredRecord {
    record: Record,
    seq: u64,
}

/// In-memory collection backed by a HashMap.
///
/// Storage key is `"type:id"`. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryCollection {
    storage: Arc<RwLock<HashMap<String, StoredRecord>>>,
    seq: Arc<AtomicU64>,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollection {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn make_key(type_name: &str, id: &Id) -> String {
        format!("{}:{}", type_name, id)
    }
}

impl Collection for InMemoryCollection {
    fn find(&self, type_name: &str, id: &Id) -> Result<Option<Record>, StoreError> {
        let key = Self::make_key(type_name, id);
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        Ok(storage.get(&key).map(|stored| stored.record.clone()))
    }

    fn find_all(&self, type_name: &str) -> Result<Vec<Record>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        let prefix = format!("{}:", type_name);
        let mut results: Vec<&StoredRecord> = storage
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, stored)| stored)
            .collect();
        results.sort_by_key(|stored| stored.seq);

        Ok(results.into_iter().map(|stored| stored.record.clone()).collect())
    }

    fn all(&self) -> Result<Vec<Record>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        let mut results: Vec<&StoredRecord> = storage.values().collect();
        results.sort_by_key(|stored| stored.seq);

        Ok(results.into_iter().map(|stored| stored.record.clone()).collect())
    }

    fn insert(&self, record: Record) -> Result<Option<Record>, StoreError> {
        let key = Self::make_key(&record.type_name(), &record.id());
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        Ok(storage
            .insert(key, StoredRecord { record, seq })
            .map(|stored| stored.record))
    }

    fn remove(&self, type_name: &str, id: &Id) -> Result<Option<Record>, StoreError> {
        let key = Self::make_key(type_name, id);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        Ok(storage.remove(&key).map(|stored| stored.record))
    }

    fn len(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.len())
    }
}
