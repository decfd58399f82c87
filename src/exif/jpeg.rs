//! APP1 Exif segment surgery on JPEG containers.
//!
//! Only the Exif APP1 segment is ever replaced. Every other segment, including
//! the entropy-coded scan data, is carried through untouched by img-parts.

use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};

const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";
/// A segment length field is 16 bits and counts itself.
const MAX_SEGMENT_CONTENTS: usize = u16::MAX as usize - 2;

/// Parse a JPEG, or `None` when the bytes are not a JPEG stream.
pub(crate) fn parse(bytes: Vec<u8>) -> Option<Jpeg> {
    match Jpeg::from_bytes(Bytes::from(bytes)) {
        Ok(jpeg) => Some(jpeg),
        Err(e) => {
            log::debug!("Not a JPEG container: {e}");
            None
        }
    }
}

/// The TIFF block embedded in the Exif APP1 segment, without the `Exif\0\0` prefix.
pub(crate) fn exif_block(jpeg: &Jpeg) -> Option<Bytes> {
    jpeg.exif()
}

/// Replace (or insert) the Exif APP1 segment with one carrying `tiff`.
///
/// An existing segment is replaced where it stands. A new one goes directly
/// after a leading JFIF APP0, or first otherwise. Fails with the oversized
/// TIFF length when the block cannot fit in a single segment.
pub(crate) fn replace_exif_block(jpeg: &mut Jpeg, tiff: Vec<u8>) -> Result<(), usize> {
    if tiff.len() + EXIF_PREFIX.len() > MAX_SEGMENT_CONTENTS {
        return Err(tiff.len());
    }

    let mut contents = Vec::with_capacity(EXIF_PREFIX.len() + tiff.len());
    contents.extend_from_slice(EXIF_PREFIX);
    contents.extend_from_slice(&tiff);
    let segment = JpegSegment::new_with_contents(APP1, Bytes::from(contents));

    let existing = find_exif_segment_pos(jpeg);
    let segments = jpeg.segments_mut();
    match existing {
        Some(pos) => segments[pos] = segment,
        None => {
            let pos = usize::from(segments.first().is_some_and(|s| s.marker() == APP0));
            segments.insert(pos, segment);
        }
    }
    Ok(())
}

pub(crate) fn encode(jpeg: Jpeg) -> Vec<u8> {
    jpeg.encoder().bytes().to_vec()
}

fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == APP1 && s.contents().starts_with(EXIF_PREFIX))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    /// A small baseline JPEG straight out of the encoder (JFIF, no Exif).
    pub(crate) fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 5) as u8, 128])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    /// Everything from the start-of-scan marker to the end of the stream.
    pub(crate) fn scan_data(bytes: &[u8]) -> &[u8] {
        let mut pos = 2;
        while pos + 4 <= bytes.len() {
            assert_eq!(bytes[pos], 0xFF, "lost marker sync at {pos}");
            if bytes[pos + 1] == 0xDA {
                return &bytes[pos..];
            }
            let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            pos += 2 + len;
        }
        panic!("no start-of-scan marker");
    }

    #[test]
    fn garbage_is_not_a_jpeg() {
        assert!(parse(b"definitely not an image".to_vec()).is_none());
    }

    #[test]
    fn inserts_after_app0_and_keeps_scan() {
        let original = sample_jpeg(16, 8);
        let mut jpeg = parse(original.clone()).unwrap();
        assert!(exif_block(&jpeg).is_none());
        let had_app0 = jpeg.segments()[0].marker() == APP0;

        replace_exif_block(&mut jpeg, b"II*\0\x08\0\0\0\0\0\0\0\0\0".to_vec()).unwrap();
        let pos = find_exif_segment_pos(&jpeg).unwrap();
        assert_eq!(pos, usize::from(had_app0));

        let written = encode(jpeg);
        assert_eq!(scan_data(&written), scan_data(&original));

        let reparsed = parse(written).unwrap();
        assert_eq!(
            exif_block(&reparsed).unwrap().as_ref(),
            b"II*\0\x08\0\0\0\0\0\0\0\0\0"
        );
    }

    #[test]
    fn replaces_in_place() {
        let mut jpeg = parse(sample_jpeg(8, 8)).unwrap();
        replace_exif_block(&mut jpeg, vec![1; 16]).unwrap();
        let count = jpeg.segments().len();
        replace_exif_block(&mut jpeg, vec![2; 32]).unwrap();
        assert_eq!(jpeg.segments().len(), count);
        assert_eq!(exif_block(&jpeg).unwrap().as_ref(), &[2; 32][..]);
    }

    #[test]
    fn oversized_block_is_rejected() {
        let mut jpeg = parse(sample_jpeg(8, 8)).unwrap();
        let too_big = MAX_SEGMENT_CONTENTS - EXIF_PREFIX.len() + 1;
        assert_eq!(replace_exif_block(&mut jpeg, vec![0; too_big]), Err(too_big));
        assert!(replace_exif_block(&mut jpeg, vec![0; too_big - 1]).is_ok());
    }
}
