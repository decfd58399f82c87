use anyhow::Result;
use chrono::Utc;
use std::sync::{Mutex, PoisonError};

use super::{ImageStore, RecordId, StoredRecord, sort_newest_first};
use crate::container::ContainerLocator;

/// In-process store. Records live only as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: RecordId,
    records: Vec<StoredRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStore for MemoryStore {
    fn insert(
        &self,
        display_name: &str,
        mime_type: &str,
        locator: &ContainerLocator,
    ) -> Result<StoredRecord> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let record = StoredRecord {
            id: inner.next_id,
            locator: locator.clone(),
            display_name: display_name.to_string(),
            mime_type: mime_type.to_string(),
            inserted_at: Utc::now(),
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    fn query_all(&self) -> Result<Vec<StoredRecord>> {
        let mut records = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_and_query_is_newest_first() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        let a = store
            .insert("IMG_1.jpg", "image/jpeg", &ContainerLocator::path("/a.jpg"))
            .unwrap();
        let b = store
            .insert("IMG_2.jpg", "image/jpeg", &ContainerLocator::path("/b.jpg"))
            .unwrap();
        assert!(b.id > a.id);

        let all = store.query_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);
        assert_eq!(all[1].display_name, "IMG_1.jpg");
    }
}
