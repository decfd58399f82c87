use thiserror::Error;

/// Failure to write a metadata block back into a container.
///
/// The container's original bytes are left untouched whenever one of these is
/// returned from an in-place (path) annotation.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The container could not be (re)opened, read or written.
    #[error("I/O error on container {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// The container is not a JPEG image, so there is nowhere to embed EXIF.
    #[error("Container {0} is not a JPEG image")]
    NotJpeg(String),

    /// The merged block no longer fits in a single APP1 segment.
    #[error("Metadata block of {0} bytes exceeds the APP1 segment limit")]
    BlockTooLarge(usize),
}

/// Failure to extract tags from a container.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error on container {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Container {0} is not a JPEG image")]
    NotJpeg(String),

    /// The APP1 Exif segment exists but its TIFF structure is malformed.
    #[error("Corrupt metadata block: {0}")]
    Corrupt(#[from] TiffError),
}

/// Structural problem found while parsing a TIFF block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TiffError {
    #[error("TIFF data too short ({0} bytes)")]
    TooShort(usize),

    #[error("Invalid TIFF byte order marker")]
    ByteOrder,

    #[error("Invalid TIFF magic number {0}")]
    Magic(u16),

    #[error("IFD at offset {0} extends beyond the block")]
    IfdOutOfBounds(usize),

    #[error("Value of tag {tag:#06x} extends beyond the block")]
    ValueOutOfBounds { tag: u16 },
}

/// Rejected insertion into a [`MetadataTagSet`](super::MetadataTagSet).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagError {
    #[error("{tag} expects {expected}")]
    WrongKind { tag: String, expected: &'static str },

    #[error("{tag} value {value:?} does not match the {format} format")]
    BadFormat {
        tag: String,
        value: String,
        format: &'static str,
    },

    #[error("{tag} value {value} is out of range")]
    OutOfRange { tag: String, value: f64 },

    #[error("Unknown tag name {0:?}")]
    UnknownTag(String),
}
