use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;

use super::{ImageStore, RecordId, StoredRecord, sort_newest_first};
use crate::container::{ContainerLocator, ContentResolver};

/// URI scheme of containers handed out by [`LibraryStore::allocate`].
pub const LIBRARY_SCHEME: &str = "library://";

const INDEX_FILE: &str = "index.json";
const MEDIA_DIR: &str = "media";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    next_id: RecordId,
    records: Vec<StoredRecord>,
}

/// A directory-backed image library.
///
/// Layout:
///
/// ```text
/// <root>/index.json      published records
/// <root>/media/<name>    container bytes
/// ```
///
/// Media files are only reachable as `library://<name>` URIs through the
/// [`ContentResolver`] impl, mirroring a platform media store where the
/// caller never sees a filesystem path.
#[derive(Debug)]
pub struct LibraryStore {
    root: PathBuf,
    index: Mutex<Index>,
}

impl LibraryStore {
    /// Open (creating if needed) the library rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(MEDIA_DIR))
            .with_context(|| format!("Failed to create library at {}", root.display()))?;

        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            let content = fs::read_to_string(&index_path).context("Failed to read library index")?;
            serde_json::from_str(&content).context("Failed to parse library index")?
        } else {
            log::debug!("No index at {}, starting empty", index_path.display());
            Index::default()
        };

        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a new, empty container for `display_name`.
    ///
    /// The container is not published until [`ImageStore::insert`] is called
    /// with the returned locator.
    pub fn allocate(&self, display_name: &str) -> Result<ContainerLocator> {
        let path = self.media_path(display_name)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to allocate {display_name}"))?;
        log::debug!("Allocated {}", path.display());
        Ok(ContainerLocator::uri(format!("{LIBRARY_SCHEME}{display_name}")))
    }

    /// Remove an allocated container that was never published.
    pub fn discard(&self, locator: &ContainerLocator) -> Result<()> {
        let ContainerLocator::Uri(uri) = locator else {
            bail!("{locator} is not a library container");
        };
        let published = self
            .index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .iter()
            .any(|r| &r.locator == locator);
        if published {
            bail!("{locator} is already published");
        }
        let path = self.resolve(uri)?;
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(())
    }

    fn media_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            bail!("Invalid media name {name:?}");
        }
        Ok(self.root.join(MEDIA_DIR).join(name))
    }

    fn resolve(&self, uri: &str) -> io::Result<PathBuf> {
        let name = uri.strip_prefix(LIBRARY_SCHEME).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("not a library URI: {uri}"))
        })?;
        self.media_path(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
    }

    fn save(&self, index: &Index) -> Result<()> {
        let content = serde_json::to_string_pretty(index)?;
        let mut tmp = NamedTempFile::new_in(&self.root).context("Failed to stage library index")?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(self.root.join(INDEX_FILE))
            .context("Failed to write library index")?;
        Ok(())
    }
}

impl ImageStore for LibraryStore {
    fn insert(
        &self,
        display_name: &str,
        mime_type: &str,
        locator: &ContainerLocator,
    ) -> Result<StoredRecord> {
        let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        if index.records.iter().any(|r| &r.locator == locator) {
            bail!("{locator} is already published");
        }

        let record = StoredRecord {
            id: index.next_id + 1,
            locator: locator.clone(),
            display_name: display_name.to_string(),
            mime_type: mime_type.to_string(),
            inserted_at: Utc::now(),
        };
        index.next_id = record.id;
        index.records.push(record.clone());

        if let Err(e) = self.save(&index) {
            index.records.pop();
            index.next_id -= 1;
            return Err(e);
        }
        log::info!("Published {} as #{}", record.display_name, record.id);
        Ok(record)
    }

    fn query_all(&self) -> Result<Vec<StoredRecord>> {
        let mut records = self
            .index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

impl ContentResolver for LibraryStore {
    fn open_read(&self, uri: &str) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(self.resolve(uri)?)?))
    }

    fn open_write(&self, uri: &str) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(MediaWriter::open(self.resolve(uri)?)?))
    }
}

/// Streams into a temp file next to the media file and swaps it in on
/// `flush`. Dropped before that, the media file keeps its previous bytes.
struct MediaWriter {
    target: PathBuf,
    pending: Option<NamedTempFile>,
}

impl MediaWriter {
    fn open(target: PathBuf) -> io::Result<Self> {
        let pending = NamedTempFile::new_in(media_dir_of(&target))?;
        Ok(Self {
            target,
            pending: Some(pending),
        })
    }

    fn pending(&mut self) -> io::Result<&mut NamedTempFile> {
        if self.pending.is_none() {
            self.pending = Some(NamedTempFile::new_in(media_dir_of(&self.target))?);
        }
        self.pending
            .as_mut()
            .ok_or_else(|| io::Error::other("media writer has no pending file"))
    }
}

impl Write for MediaWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.pending()?.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(mut tmp) = self.pending.take() else {
            return Ok(());
        };
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        if let Ok(metadata) = fs::metadata(&self.target) {
            fs::set_permissions(tmp.path(), metadata.permissions())?;
        }
        tmp.persist(&self.target).map_err(|e| e.error)?;
        log::debug!("Replaced {}", self.target.display());
        Ok(())
    }
}

fn media_dir_of(target: &Path) -> &Path {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
