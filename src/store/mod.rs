//! The shared image store that captured photos are published to.

mod library;
mod memory;

pub use library::{LIBRARY_SCHEME, LibraryStore};
pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::container::ContainerLocator;

pub type RecordId = u64;

/// One published image as the store knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub locator: ContainerLocator,
    pub display_name: String,
    pub mime_type: String,
    pub inserted_at: DateTime<Utc>,
}

/// A queryable collection of published images.
///
/// Implementations are shared between the capture and catalog sides and may be
/// called from blocking worker threads.
pub trait ImageStore: Send + Sync {
    /// Publish a container. The record becomes visible to `query_all` immediately.
    fn insert(
        &self,
        display_name: &str,
        mime_type: &str,
        locator: &ContainerLocator,
    ) -> Result<StoredRecord>;

    /// Every record, newest insertion first.
    fn query_all(&self) -> Result<Vec<StoredRecord>>;
}

/// Newest first; ids break ties between records inserted in the same instant.
pub(crate) fn sort_newest_first(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| {
        b.inserted_at
            .cmp(&a.inserted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
