use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use super::{CaptureDevice, CaptureOutcome};
use crate::container::{ContainerLocator, ContentResolver, no_resolver};

/// A [`CaptureDevice`] that "shoots" by copying an existing image file into
/// the target container.
///
/// A missing or unreadable source is reported as a capture that produced no
/// result, i.e. [`CaptureOutcome::Cancelled`].
pub struct ImportDevice {
    source: PathBuf,
    resolver: Option<Arc<dyn ContentResolver>>,
}

impl ImportDevice {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            resolver: None,
        }
    }

    /// Needed when capture targets are [`ContainerLocator::Uri`]s.
    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

#[async_trait::async_trait]
impl CaptureDevice for ImportDevice {
    async fn capture(&self, target: &ContainerLocator, mime_type: &str) -> CaptureOutcome {
        let bytes = match tokio::fs::read(&self.source).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                log::warn!("{} is empty, nothing captured", self.source.display());
                return CaptureOutcome::Cancelled;
            }
            Err(e) => {
                log::warn!("Cannot read {}: {e}", self.source.display());
                return CaptureOutcome::Cancelled;
            }
        };
        log::debug!("Importing {} ({mime_type}) into {target}", self.source.display());

        let result = match target {
            ContainerLocator::Path(path) => tokio::fs::write(path, &bytes).await,
            ContainerLocator::Uri(uri) => {
                let resolver = self.resolver.clone();
                let uri = uri.clone();
                tokio::task::spawn_blocking(move || {
                    let resolver = resolver.ok_or_else(|| no_resolver(&uri))?;
                    let mut writer = resolver.open_write(&uri)?;
                    writer.write_all(&bytes)?;
                    writer.flush()
                })
                .await
                .unwrap_or_else(|e| Err(std::io::Error::other(e)))
            }
        };

        match result {
            Ok(()) => CaptureOutcome::Success,
            Err(e) => {
                log::warn!("Failed to write capture into {target}: {e}");
                CaptureOutcome::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibraryStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copies_into_path_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let target = dir.path().join("out.jpg");

        let outcome = ImportDevice::new(&source)
            .capture(&ContainerLocator::path(&target), "image/jpeg")
            .await;
        assert_eq!(outcome, CaptureOutcome::Success);
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn copies_into_library_uri() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let store = Arc::new(LibraryStore::open(dir.path().join("lib")).unwrap());
        let target = store.allocate("IMG_1.jpg").unwrap();

        let outcome = ImportDevice::new(&source)
            .with_resolver(store.clone())
            .capture(&target, "image/jpeg")
            .await;
        assert_eq!(outcome, CaptureOutcome::Success);
        assert_eq!(
            std::fs::read(dir.path().join("lib/media/IMG_1.jpg")).unwrap(),
            b"jpeg bytes"
        );
    }

    #[tokio::test]
    async fn missing_source_is_no_result() {
        let dir = TempDir::new().unwrap();
        let outcome = ImportDevice::new(dir.path().join("nope.jpg"))
            .capture(&ContainerLocator::path(dir.path().join("out.jpg")), "image/jpeg")
            .await;
        assert_eq!(outcome, CaptureOutcome::Cancelled);
    }

    #[tokio::test]
    async fn uri_without_resolver_is_no_result() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let outcome = ImportDevice::new(&source)
            .capture(&ContainerLocator::uri("library://x.jpg"), "image/jpeg")
            .await;
        assert_eq!(outcome, CaptureOutcome::Cancelled);
    }
}
