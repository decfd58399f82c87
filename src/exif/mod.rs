//! EXIF metadata embedding and extraction for JPEG containers.
//!
//! - [`MetadataTagSet`]: validated date/time and GPS tags
//! - [`MetadataWriter`]: merges a tag set into a container and reads it back
//! - [`read_summary`]: independent nom-exif view of a file, used by `show`
//!
//! Writes are append-only at the TIFF level: edited IFDs are re-emitted at the
//! end of the block and unrelated fields keep their original bytes and offsets.

mod codec;
mod error;
mod jpeg;
mod reader;
mod tags;
mod tiff;
mod writer;

pub use error::{ExtractionError, TagError, TiffError, WriteError};
pub use reader::{ExifSummary, read_summary};
pub use tags::{DATE_FORMAT, DATE_TIME_FORMAT, MetadataTagSet, TIME_FORMAT, TagName, TagValue};
pub use writer::MetadataWriter;

#[cfg(test)]
pub(crate) use jpeg::tests::sample_jpeg;
