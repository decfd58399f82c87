use image::RgbaImage;
use image::imageops::FilterType;
use std::sync::Arc;

use crate::container::{ContainerLocator, ContentResolver, read_all};

/// Default downsample factor for list previews.
pub const DEFAULT_SAMPLE_SIZE: u32 = 4;

/// Decodes a reduced-size preview of a container.
///
/// Each dimension is divided by the sample size (at least 1 pixel). Anything
/// that goes wrong yields no preview rather than an error.
#[derive(Clone)]
pub struct ThumbnailDecoder {
    resolver: Option<Arc<dyn ContentResolver>>,
    sample_size: u32,
}

impl Default for ThumbnailDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailDecoder {
    pub fn new() -> Self {
        Self {
            resolver: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// A sample size of 0 is treated as 1.
    pub fn with_sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn decode(&self, locator: &ContainerLocator) -> Option<RgbaImage> {
        let bytes = match read_all(locator, self.resolver.as_deref()) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("No preview for {locator}: {e}");
                return None;
            }
        };
        let img = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::debug!("No preview for {locator}: {e}");
                return None;
            }
        };

        let width = (img.width() / self.sample_size).max(1);
        let height = (img.height() / self.sample_size).max(1);
        Some(img.resize_exact(width, height, FilterType::Triangle).to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::sample_jpeg;
    use tempfile::TempDir;

    #[test]
    fn preview_is_quarter_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, sample_jpeg(64, 48)).unwrap();

        let preview = ThumbnailDecoder::new()
            .decode(&ContainerLocator::path(&path))
            .unwrap();
        assert_eq!(preview.dimensions(), (16, 12));
    }

    #[test]
    fn tiny_images_keep_one_pixel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, sample_jpeg(3, 2)).unwrap();

        let preview = ThumbnailDecoder::new()
            .decode(&ContainerLocator::path(&path))
            .unwrap();
        assert_eq!(preview.dimensions(), (1, 1));
    }

    #[test]
    fn garbage_and_missing_yield_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let decoder = ThumbnailDecoder::new().with_sample_size(0);
        assert_eq!(decoder.sample_size(), 1);
        assert!(decoder.decode(&ContainerLocator::path(&path)).is_none());
        assert!(decoder.decode(&ContainerLocator::path(dir.path().join("x.jpg"))).is_none());
        assert!(decoder.decode(&ContainerLocator::uri("library://x.jpg")).is_none());
    }
}
