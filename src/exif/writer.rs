use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::codec::{decode_tags, encode_tags};
use super::error::{ExtractionError, WriteError};
use super::jpeg;
use super::tags::MetadataTagSet;
use super::tiff::TiffBlock;
use crate::container::{ContainerLocator, ContentResolver, no_resolver, read_all};

/// Embeds a [`MetadataTagSet`] into JPEG containers and reads it back.
///
/// Path containers are rewritten atomically: the merged image is written to a
/// sibling temporary file which then replaces the original, so a failed
/// annotation never leaves a half-written container behind. URI containers
/// are copied into the staging directory, annotated there and streamed back.
#[derive(Clone)]
pub struct MetadataWriter {
    resolver: Option<Arc<dyn ContentResolver>>,
    staging_dir: PathBuf,
}

impl Default for MetadataWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataWriter {
    pub fn new() -> Self {
        Self {
            resolver: None,
            staging_dir: std::env::temp_dir(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn resolver(&self) -> Option<&Arc<dyn ContentResolver>> {
        self.resolver.as_ref()
    }

    /// Merge `tags` into the container's metadata block.
    ///
    /// Tags already present are overwritten, every other field and image
    /// segment is preserved byte for byte. An empty tag set leaves the
    /// container alone.
    pub fn annotate(
        &self,
        locator: &ContainerLocator,
        tags: &MetadataTagSet,
    ) -> Result<(), WriteError> {
        if tags.is_empty() {
            log::debug!("Nothing to write into {locator}");
            return Ok(());
        }

        match locator {
            ContainerLocator::Path(path) => self.annotate_file(locator, path, tags),
            ContainerLocator::Uri(uri) => self.annotate_staged(locator, uri, tags),
        }?;

        log::info!("Wrote {} tag(s) into {locator}", tags.len());
        Ok(())
    }

    /// Read the recognized tags embedded in the container.
    ///
    /// A JPEG without a metadata block yields an empty set.
    pub fn read_tags(&self, locator: &ContainerLocator) -> Result<MetadataTagSet, ExtractionError> {
        let bytes = read_all(locator, self.resolver.as_deref()).map_err(|source| {
            ExtractionError::Io {
                locator: locator.to_string(),
                source,
            }
        })?;
        let jpeg =
            jpeg::parse(bytes).ok_or_else(|| ExtractionError::NotJpeg(locator.to_string()))?;
        match jpeg::exif_block(&jpeg) {
            Some(raw) => Ok(decode_tags(&TiffBlock::parse(&raw)?)?),
            None => Ok(MetadataTagSet::new()),
        }
    }

    fn annotate_file(
        &self,
        locator: &ContainerLocator,
        path: &Path,
        tags: &MetadataTagSet,
    ) -> Result<(), WriteError> {
        let io_err = |source| WriteError::Io {
            locator: locator.to_string(),
            source,
        };

        let original = fs::read(path).map_err(io_err)?;
        let merged = merge(original, tags, locator)?;

        // Fail before touching the directory when the container itself is read-only.
        let metadata = OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|f| f.metadata())
            .map_err(io_err)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&merged).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        fs::set_permissions(tmp.path(), metadata.permissions()).map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn annotate_staged(
        &self,
        locator: &ContainerLocator,
        uri: &str,
        tags: &MetadataTagSet,
    ) -> Result<(), WriteError> {
        let io_err = |source| WriteError::Io {
            locator: locator.to_string(),
            source,
        };
        let resolver = self.resolver.as_ref().ok_or_else(|| io_err(no_resolver(uri)))?;

        // The staged copy is removed when `staged` drops, on every path out.
        let mut staged = NamedTempFile::new_in(&self.staging_dir).map_err(io_err)?;
        let mut reader = resolver.open_read(uri).map_err(io_err)?;
        io::copy(&mut reader, staged.as_file_mut()).map_err(io_err)?;
        drop(reader);
        log::debug!("Staged {locator} at {}", staged.path().display());

        let original = fs::read(staged.path()).map_err(io_err)?;
        let merged = merge(original, tags, locator)?;
        fs::write(staged.path(), &merged).map_err(io_err)?;

        let mut writer = resolver.open_write(uri).map_err(io_err)?;
        io::copy(&mut fs::File::open(staged.path()).map_err(io_err)?, &mut writer)
            .map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        staged.close().map_err(io_err)
    }
}

/// Splice `tags` into the container bytes.
///
/// A malformed existing block is replaced by a fresh one rather than failing
/// the write: the image data is still intact and worth stamping.
fn merge(
    bytes: Vec<u8>,
    tags: &MetadataTagSet,
    locator: &ContainerLocator,
) -> Result<Vec<u8>, WriteError> {
    let mut jpeg = jpeg::parse(bytes).ok_or_else(|| WriteError::NotJpeg(locator.to_string()))?;

    let mut block = match jpeg::exif_block(&jpeg) {
        Some(raw) => TiffBlock::parse(&raw).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable metadata block in {locator}: {e}");
            TiffBlock::empty()
        }),
        None => TiffBlock::empty(),
    };
    encode_tags(&mut block, tags);

    jpeg::replace_exif_block(&mut jpeg, block.to_bytes()).map_err(WriteError::BlockTooLarge)?;
    Ok(jpeg::encode(jpeg))
}
