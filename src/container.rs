//! Container addressing.
//!
//! A container is the byte-addressable image object that metadata gets embedded
//! into. It is either a plain file that can be rewritten in place, or an opaque
//! handle (for example a `library://` URI handed out by
//! [`LibraryStore`](crate::store::LibraryStore)) that can only be streamed in and
//! out through a [`ContentResolver`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of containers metadata can be embedded into.
const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Where a container lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerLocator {
    /// Random-access file, annotated in place.
    Path(PathBuf),
    /// Stream-only handle, annotated through a staged local copy.
    Uri(String),
}

impl ContainerLocator {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into())
    }
}

impl fmt::Display for ContainerLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Uri(uri) => f.write_str(uri),
        }
    }
}

/// Opens stream-only containers by URI.
///
/// Bytes streamed into `open_write` replace the container's previous content
/// entirely once `flush` succeeds. A writer dropped before a successful flush
/// must leave the previous content in place.
pub trait ContentResolver: Send + Sync {
    fn open_read(&self, uri: &str) -> io::Result<Box<dyn Read + Send>>;
    fn open_write(&self, uri: &str) -> io::Result<Box<dyn Write + Send>>;
}

pub(crate) fn no_resolver(uri: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("no content resolver configured for {uri}"),
    )
}

/// Read a whole container into memory, whichever addressing mode it uses.
pub(crate) fn read_all(
    locator: &ContainerLocator,
    resolver: Option<&dyn ContentResolver>,
) -> io::Result<Vec<u8>> {
    match locator {
        ContainerLocator::Path(path) => std::fs::read(path),
        ContainerLocator::Uri(uri) => {
            let resolver = resolver.ok_or_else(|| no_resolver(uri))?;
            let mut reader = resolver.open_read(uri)?;
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}

/// Collect JPEG files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks).
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_jpeg(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_jpeg(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| JPEG_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}
