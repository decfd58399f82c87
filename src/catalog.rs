//! The newest-first list of published images with their decoded metadata.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::CatalogConfig;
use crate::container::ContainerLocator;
use crate::exif::{MetadataTagSet, MetadataWriter};
use crate::location::GeoPoint;
use crate::store::{ImageStore, RecordId, StoredRecord};
use crate::thumbnail::ThumbnailDecoder;

/// A published image as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub id: RecordId,
    pub locator: ContainerLocator,
    pub display_name: String,
    pub inserted_at: DateTime<Utc>,
    /// `DateTime`, falling back to `DateTimeOriginal` then `DateTimeDigitized`.
    pub date_time: Option<String>,
    pub geo_location: Option<GeoPoint>,
}

impl ImageRecord {
    pub fn from_tags(stored: StoredRecord, tags: &MetadataTagSet) -> Self {
        Self {
            date_time: tags.date_time().map(str::to_string),
            geo_location: tags.geo_point(),
            ..Self::without_metadata(stored)
        }
    }

    pub fn without_metadata(stored: StoredRecord) -> Self {
        Self {
            id: stored.id,
            locator: stored.locator,
            display_name: stored.display_name,
            inserted_at: stored.inserted_at,
            date_time: None,
            geo_location: None,
        }
    }
}

/// A record plus its list preview.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub record: ImageRecord,
    pub preview: Option<RgbaImage>,
}

/// Lists the store with metadata read back out of each container.
///
/// Every call re-queries the store and re-reads every container. One bad
/// container only blanks its own record.
pub struct CatalogReader {
    store: Arc<dyn ImageStore>,
    writer: MetadataWriter,
    thumbnails: ThumbnailDecoder,
    max_parallel_reads: usize,
}

impl CatalogReader {
    pub fn new(store: Arc<dyn ImageStore>, writer: MetadataWriter) -> Self {
        let mut thumbnails = ThumbnailDecoder::new();
        if let Some(resolver) = writer.resolver() {
            thumbnails = thumbnails.with_resolver(Arc::clone(resolver));
        }
        Self {
            store,
            writer,
            thumbnails,
            max_parallel_reads: CatalogConfig::default().max_parallel_reads,
        }
    }

    pub fn with_config(mut self, config: &CatalogConfig) -> Self {
        self.max_parallel_reads = config.max_parallel_reads.max(1);
        self.thumbnails = self.thumbnails.with_sample_size(config.thumbnail_sample_size);
        self
    }

    /// Every record, newest first, with `date_time` and `geo_location` decoded.
    pub async fn list(&self) -> Result<Vec<ImageRecord>> {
        let writer = self.writer.clone();
        self.read_all(
            move |stored| read_record(&writer, stored),
            ImageRecord::without_metadata,
        )
        .await
    }

    /// Like [`list`](Self::list), with a downsampled preview per record.
    pub async fn list_with_previews(&self) -> Result<Vec<CatalogEntry>> {
        let writer = self.writer.clone();
        let thumbnails = self.thumbnails.clone();
        self.read_all(
            move |stored| {
                let preview = thumbnails.decode(&stored.locator);
                let record = read_record(&writer, stored);
                CatalogEntry { record, preview }
            },
            |stored| CatalogEntry {
                record: ImageRecord::without_metadata(stored),
                preview: None,
            },
        )
        .await
    }

    /// Run `read` over every stored record on blocking workers, at most
    /// `max_parallel_reads` at once, and return the results in store order.
    ///
    /// A record whose read panics gets `fallback` instead.
    async fn read_all<T, F, G>(&self, read: F, fallback: G) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(StoredRecord) -> T + Send + Sync + 'static,
        G: Fn(StoredRecord) -> T + Send + Sync + 'static,
    {
        let store = Arc::clone(&self.store);
        let records = tokio::task::spawn_blocking(move || store.query_all())
            .await
            .context("Store query task failed")??;
        log::debug!("Catalog query returned {} record(s)", records.len());

        let read = Arc::new(read);
        let fallback = Arc::new(fallback);
        let permits = Arc::new(Semaphore::new(self.max_parallel_reads));
        let mut tasks = JoinSet::new();
        for (index, stored) in records.into_iter().enumerate() {
            let read = Arc::clone(&read);
            let fallback = Arc::clone(&fallback);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await?;
                let kept = stored.clone();
                let value = match tokio::task::spawn_blocking(move || (*read)(stored)).await {
                    Ok(value) => value,
                    Err(e) => {
                        log::warn!("Reading {} failed: {e}", kept.display_name);
                        (*fallback)(kept)
                    }
                };
                anyhow::Ok((index, value))
            });
        }

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(tasks.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, value) = joined.context("Catalog read task failed")??;
            slots[index] = Some(value);
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

fn read_record(writer: &MetadataWriter, stored: StoredRecord) -> ImageRecord {
    match writer.read_tags(&stored.locator) {
        Ok(tags) => ImageRecord::from_tags(stored, &tags),
        Err(e) => {
            log::warn!("Cannot read metadata of {}: {e}", stored.display_name);
            ImageRecord::without_metadata(stored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::{TagName, TagValue, sample_jpeg};
    use crate::location::LocationFix;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::TempDir;

    fn publish(store: &MemoryStore, dir: &Path, name: &str, fix: Option<LocationFix>) {
        let path = dir.join(name);
        std::fs::write(&path, sample_jpeg(32, 16)).unwrap();
        let locator = ContainerLocator::path(&path);
        let captured_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        MetadataWriter::new()
            .annotate(&locator, &MetadataTagSet::for_capture(captured_at, fix.as_ref()))
            .unwrap();
        store.insert(name, "image/jpeg", &locator).unwrap();
    }

    #[tokio::test]
    async fn lists_newest_first_with_metadata() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        publish(&store, dir.path(), "a.jpg", Some(LocationFix::new(40.4168, -3.7038)));
        publish(&store, dir.path(), "b.jpg", None);

        let records = CatalogReader::new(store.clone(), MetadataWriter::new())
            .list()
            .await
            .unwrap();
        let names: Vec<_> = records.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["b.jpg", "a.jpg"]);
        assert_eq!(records[0].date_time.as_deref(), Some("2024:05:01 09:30:00"));
        assert!(records[0].geo_location.is_none());
        assert_eq!(
            records[1].geo_location.unwrap().to_string(),
            "40.4168, -3.7038"
        );
    }

    #[tokio::test]
    async fn corrupted_containers_only_blank_their_record() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        for i in 0..6 {
            publish(&store, dir.path(), &format!("{i}.jpg"), Some(LocationFix::new(1.0, 2.0)));
        }
        std::fs::write(dir.path().join("1.jpg"), b"truncated").unwrap();
        std::fs::remove_file(dir.path().join("4.jpg")).unwrap();

        let reader = CatalogReader::new(store.clone(), MetadataWriter::new()).with_config(
            &CatalogConfig {
                max_parallel_reads: 2,
                ..CatalogConfig::default()
            },
        );
        let records = reader.list().await.unwrap();
        assert_eq!(records.len(), 6);

        let blank: Vec<_> = records
            .iter()
            .filter(|r| r.date_time.is_none() && r.geo_location.is_none())
            .map(|r| r.display_name.as_str())
            .collect();
        assert_eq!(blank, ["4.jpg", "1.jpg"]);
    }

    #[tokio::test]
    async fn date_time_falls_back_to_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cam.jpg");
        std::fs::write(&path, sample_jpeg(8, 8)).unwrap();
        let locator = ContainerLocator::path(&path);
        let mut tags = MetadataTagSet::new();
        tags.insert(
            TagName::DateTimeOriginal,
            TagValue::Text("2020:01:01 00:00:01".into()),
        )
        .unwrap();
        MetadataWriter::new().annotate(&locator, &tags).unwrap();

        let store = Arc::new(MemoryStore::new());
        store.insert("cam.jpg", "image/jpeg", &locator).unwrap();
        let records = CatalogReader::new(store, MetadataWriter::new())
            .list()
            .await
            .unwrap();
        assert_eq!(records[0].date_time.as_deref(), Some("2020:01:01 00:00:01"));
    }

    #[tokio::test]
    async fn previews_follow_records() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        publish(&store, dir.path(), "a.jpg", None);
        publish(&store, dir.path(), "b.jpg", None);
        std::fs::write(dir.path().join("a.jpg"), b"garbage").unwrap();

        let entries = CatalogReader::new(store, MetadataWriter::new())
            .list_with_previews()
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.display_name, "b.jpg");
        assert_eq!(entries[0].preview.as_ref().unwrap().dimensions(), (8, 4));
        assert!(entries[1].preview.is_none());
        assert!(entries[1].record.date_time.is_none());
    }

    #[tokio::test]
    async fn panicking_read_only_blanks_its_record() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        for name in ["a.jpg", "boom.jpg", "c.jpg"] {
            publish(&store, dir.path(), name, Some(LocationFix::new(1.0, 2.0)));
        }

        let reader = CatalogReader::new(store, MetadataWriter::new());
        let writer = MetadataWriter::new();
        let records = reader
            .read_all(
                move |stored| {
                    if stored.display_name == "boom.jpg" {
                        panic!("decoder blew up on {}", stored.display_name);
                    }
                    read_record(&writer, stored)
                },
                ImageRecord::without_metadata,
            )
            .await
            .unwrap();

        let names: Vec<_> = records.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["c.jpg", "boom.jpg", "a.jpg"]);
        assert!(records[0].geo_location.is_some());
        assert!(records[1].geo_location.is_none());
        assert!(records[1].date_time.is_none());
        assert!(records[2].geo_location.is_some());
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let reader = CatalogReader::new(Arc::new(MemoryStore::new()), MetadataWriter::new());
        assert!(reader.list().await.unwrap().is_empty());
    }
}
