//! Append-only editor for the TIFF structure inside an EXIF block.
//!
//! The original bytes are never moved or rewritten. Edited IFDs are appended to
//! the end of the block and the header / sub-IFD pointers are redirected to the
//! new copies, so every untouched entry (including ones holding offsets, such as
//! MakerNote or the IFD1 thumbnail) keeps pointing at valid data.

use super::error::TiffError;

pub(crate) const TAG_DATE_TIME: u16 = 0x0132;
pub(crate) const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
pub(crate) const TAG_GPS_IFD_POINTER: u16 = 0x8825;
pub(crate) const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
pub(crate) const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;

pub(crate) const TAG_GPS_VERSION_ID: u16 = 0x0000;
pub(crate) const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
pub(crate) const TAG_GPS_LATITUDE: u16 = 0x0002;
pub(crate) const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
pub(crate) const TAG_GPS_LONGITUDE: u16 = 0x0004;
pub(crate) const TAG_GPS_ALTITUDE_REF: u16 = 0x0005;
pub(crate) const TAG_GPS_ALTITUDE: u16 = 0x0006;
pub(crate) const TAG_GPS_TIME_STAMP: u16 = 0x0007;
pub(crate) const TAG_GPS_DATE_STAMP: u16 = 0x001D;

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_IFD: u16 = 13;

const ENTRY_SIZE: usize = 12;
const EMPTY_LITTLE_ENDIAN_HEADER: [u8; 8] = [b'I', b'I', 42, 0, 8, 0, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, b: &[u8]) -> u16 {
        let raw = [b[0], b[1]];
        match self {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        let raw = [b[0], b[1], b[2], b[3]];
        match self {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        }
    }

    fn put_u16(self, v: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    fn put_u32(self, v: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }
}

/// Size in bytes of one value of a TIFF field type.
fn type_size(field_type: u16) -> Option<usize> {
    match field_type {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 | 13 => Some(4),
        5 | 10 | 12 => Some(8),
        _ => None,
    }
}

/// Which IFD a tag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IfdKind {
    Primary,
    Exif,
    Gps,
}

#[derive(Debug, Clone)]
enum Payload {
    /// The entry's original value/offset word, still valid against the original bytes.
    Original([u8; 4]),
    /// A value we produced, already encoded in the block's byte order.
    Owned(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Field {
    tag: u16,
    field_type: u16,
    count: u32,
    payload: Payload,
}

#[derive(Debug, Clone, Default)]
struct Ifd {
    fields: Vec<Field>,
    next: u32,
    dirty: bool,
}

impl Ifd {
    fn get(&self, tag: u16) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    fn set(&mut self, field: Field) {
        self.fields.retain(|f| f.tag != field.tag);
        self.fields.push(field);
        self.dirty = true;
    }
}

/// A parsed EXIF TIFF block that can be edited and re-serialized.
#[derive(Debug, Clone)]
pub(crate) struct TiffBlock {
    order: ByteOrder,
    data: Vec<u8>,
    primary: Ifd,
    exif: Option<Ifd>,
    gps: Option<Ifd>,
}

impl TiffBlock {
    /// A fresh little-endian block with an empty IFD0.
    pub(crate) fn empty() -> Self {
        Self {
            order: ByteOrder::Little,
            data: EMPTY_LITTLE_ENDIAN_HEADER.to_vec(),
            primary: Ifd {
                dirty: true,
                ..Ifd::default()
            },
            exif: None,
            gps: None,
        }
    }

    pub(crate) fn parse(data: &[u8]) -> Result<Self, TiffError> {
        if data.len() < 8 {
            return Err(TiffError::TooShort(data.len()));
        }
        let order = match &data[0..2] {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return Err(TiffError::ByteOrder),
        };
        let magic = order.u16(&data[2..4]);
        if magic != 42 {
            return Err(TiffError::Magic(magic));
        }

        let primary_offset = order.u32(&data[4..8]) as usize;
        let primary = read_ifd(data, order, primary_offset)?;
        let exif = sub_ifd_offset(&primary, order, TAG_EXIF_IFD_POINTER)
            .map(|offset| read_ifd(data, order, offset))
            .transpose()?;
        let gps = sub_ifd_offset(&primary, order, TAG_GPS_IFD_POINTER)
            .map(|offset| read_ifd(data, order, offset))
            .transpose()?;

        Ok(Self {
            order,
            data: data.to_vec(),
            primary,
            exif,
            gps,
        })
    }

    fn ifd(&self, kind: IfdKind) -> Option<&Ifd> {
        match kind {
            IfdKind::Primary => Some(&self.primary),
            IfdKind::Exif => self.exif.as_ref(),
            IfdKind::Gps => self.gps.as_ref(),
        }
    }

    fn ifd_mut(&mut self, kind: IfdKind) -> &mut Ifd {
        let fresh = || Ifd {
            dirty: true,
            ..Ifd::default()
        };
        match kind {
            IfdKind::Primary => &mut self.primary,
            IfdKind::Exif => self.exif.get_or_insert_with(fresh),
            IfdKind::Gps => self.gps.get_or_insert_with(fresh),
        }
    }

    /// Number of entries in an IFD (0 when the IFD does not exist).
    pub(crate) fn entry_count(&self, kind: IfdKind) -> usize {
        self.ifd(kind).map_or(0, |ifd| ifd.fields.len())
    }

    pub(crate) fn has_tag(&self, kind: IfdKind, tag: u16) -> bool {
        self.ifd(kind).and_then(|ifd| ifd.get(tag)).is_some()
    }

    fn field(&self, kind: IfdKind, tag: u16) -> Option<&Field> {
        self.ifd(kind)?.get(tag)
    }

    /// Raw value bytes of a field, resolving out-of-line values.
    fn value<'a>(&'a self, field: &'a Field) -> Result<&'a [u8], TiffError> {
        match &field.payload {
            Payload::Owned(bytes) => Ok(bytes),
            Payload::Original(word) => {
                let out_of_bounds = TiffError::ValueOutOfBounds { tag: field.tag };
                let size = type_size(field.field_type)
                    .and_then(|size| size.checked_mul(field.count as usize))
                    .ok_or_else(|| out_of_bounds.clone())?;
                if size <= 4 {
                    return Ok(&word[..size]);
                }
                let offset = self.order.u32(word) as usize;
                let end = offset.checked_add(size).ok_or_else(|| out_of_bounds.clone())?;
                self.data.get(offset..end).ok_or(out_of_bounds)
            }
        }
    }

    /// NUL-terminated text of an ASCII field, trailing padding trimmed.
    pub(crate) fn ascii(&self, kind: IfdKind, tag: u16) -> Result<Option<String>, TiffError> {
        let Some(field) = self.field(kind, tag) else {
            return Ok(None);
        };
        if field.field_type != TYPE_ASCII && field.field_type != TYPE_UNDEFINED {
            return Ok(None);
        }
        let bytes = self.value(field)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]).trim_end().to_string();
        Ok((!text.is_empty()).then_some(text))
    }

    /// Unsigned rationals of a RATIONAL field as `(numerator, denominator)` pairs.
    pub(crate) fn rationals(
        &self,
        kind: IfdKind,
        tag: u16,
    ) -> Result<Option<Vec<(u32, u32)>>, TiffError> {
        let Some(field) = self.field(kind, tag) else {
            return Ok(None);
        };
        if field.field_type != TYPE_RATIONAL {
            return Ok(None);
        }
        let bytes = self.value(field)?;
        let pairs = bytes
            .chunks_exact(8)
            .map(|c| (self.order.u32(&c[0..4]), self.order.u32(&c[4..8])))
            .collect();
        Ok(Some(pairs))
    }

    /// First byte of a BYTE/UNDEFINED field.
    pub(crate) fn byte(&self, kind: IfdKind, tag: u16) -> Result<Option<u8>, TiffError> {
        let Some(field) = self.field(kind, tag) else {
            return Ok(None);
        };
        if field.field_type != TYPE_BYTE && field.field_type != TYPE_UNDEFINED {
            return Ok(None);
        }
        Ok(self.value(field)?.first().copied())
    }

    /// Store `field`, leaving the IFD clean when it already holds that value.
    fn put(&mut self, kind: IfdKind, field: Field) {
        let unchanged = match (self.field(kind, field.tag), &field.payload) {
            (Some(existing), Payload::Owned(bytes)) => {
                existing.field_type == field.field_type
                    && existing.count == field.count
                    && self.value(existing).is_ok_and(|v| v == bytes.as_slice())
            }
            _ => false,
        };
        if !unchanged {
            self.ifd_mut(kind).set(field);
        }
    }

    pub(crate) fn set_ascii(&mut self, kind: IfdKind, tag: u16, text: &str) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u32;
        self.put(kind, Field {
            tag,
            field_type: TYPE_ASCII,
            count,
            payload: Payload::Owned(bytes),
        });
    }

    pub(crate) fn set_rationals(&mut self, kind: IfdKind, tag: u16, values: &[(u32, u32)]) {
        let order = self.order;
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for (numerator, denominator) in values {
            bytes.extend_from_slice(&order.put_u32(*numerator));
            bytes.extend_from_slice(&order.put_u32(*denominator));
        }
        self.put(kind, Field {
            tag,
            field_type: TYPE_RATIONAL,
            count: values.len() as u32,
            payload: Payload::Owned(bytes),
        });
    }

    pub(crate) fn set_bytes(&mut self, kind: IfdKind, tag: u16, values: &[u8]) {
        self.put(kind, Field {
            tag,
            field_type: TYPE_BYTE,
            count: values.len() as u32,
            payload: Payload::Owned(values.to_vec()),
        });
    }

    /// Serialize the block. Untouched blocks come back byte-for-byte.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let sub_dirty = |ifd: &Option<Ifd>| ifd.as_ref().is_some_and(|i| i.dirty);
        if !self.primary.dirty && !sub_dirty(&self.exif) && !sub_dirty(&self.gps) {
            return self.data.clone();
        }

        let mut out = self.data.clone();
        let mut primary = self.primary.clone();

        if let Some(gps) = self.gps.as_ref().filter(|i| i.dirty) {
            let offset = self.append_ifd(&mut out, gps);
            primary.set(self.pointer_field(TAG_GPS_IFD_POINTER, offset));
        }
        if let Some(exif) = self.exif.as_ref().filter(|i| i.dirty) {
            let offset = self.append_ifd(&mut out, exif);
            primary.set(self.pointer_field(TAG_EXIF_IFD_POINTER, offset));
        }

        let primary_offset = self.append_ifd(&mut out, &primary);
        out[4..8].copy_from_slice(&self.order.put_u32(primary_offset));
        out
    }

    fn pointer_field(&self, tag: u16, offset: u32) -> Field {
        Field {
            tag,
            field_type: TYPE_LONG,
            count: 1,
            payload: Payload::Owned(self.order.put_u32(offset).to_vec()),
        }
    }

    /// Append an IFD (entries sorted by tag, then out-of-line values) and
    /// return its offset.
    fn append_ifd(&self, out: &mut Vec<u8>, ifd: &Ifd) -> u32 {
        let order = self.order;
        pad_to_word(out);

        let start = out.len();
        let mut fields: Vec<&Field> = ifd.fields.iter().collect();
        fields.sort_by_key(|f| f.tag);

        let values_start = start + 2 + fields.len() * ENTRY_SIZE + 4;
        let mut entries = Vec::with_capacity(fields.len() * ENTRY_SIZE);
        let mut values = Vec::new();

        for field in &fields {
            entries.extend_from_slice(&order.put_u16(field.tag));
            entries.extend_from_slice(&order.put_u16(field.field_type));
            entries.extend_from_slice(&order.put_u32(field.count));
            match &field.payload {
                Payload::Original(word) => entries.extend_from_slice(word),
                Payload::Owned(bytes) if bytes.len() <= 4 => {
                    let mut word = [0u8; 4];
                    word[..bytes.len()].copy_from_slice(bytes);
                    entries.extend_from_slice(&word);
                }
                Payload::Owned(bytes) => {
                    let offset = (values_start + values.len()) as u32;
                    entries.extend_from_slice(&order.put_u32(offset));
                    values.extend_from_slice(bytes);
                    pad_to_word(&mut values);
                }
            }
        }

        out.extend_from_slice(&order.put_u16(fields.len() as u16));
        out.extend_from_slice(&entries);
        out.extend_from_slice(&order.put_u32(ifd.next));
        out.extend_from_slice(&values);
        start as u32
    }
}

fn pad_to_word(bytes: &mut Vec<u8>) {
    if bytes.len() % 2 == 1 {
        bytes.push(0);
    }
}

fn read_ifd(data: &[u8], order: ByteOrder, offset: usize) -> Result<Ifd, TiffError> {
    let out_of_bounds = || TiffError::IfdOutOfBounds(offset);
    if offset < 8 || offset.checked_add(2).is_none_or(|end| end > data.len()) {
        return Err(out_of_bounds());
    }
    let count = order.u16(&data[offset..]) as usize;
    let entries_start = offset + 2;
    let entries_end = entries_start + count * ENTRY_SIZE;
    if entries_end + 4 > data.len() {
        return Err(out_of_bounds());
    }

    let fields = data[entries_start..entries_end]
        .chunks_exact(ENTRY_SIZE)
        .map(|entry| Field {
            tag: order.u16(&entry[0..2]),
            field_type: order.u16(&entry[2..4]),
            count: order.u32(&entry[4..8]),
            payload: Payload::Original([entry[8], entry[9], entry[10], entry[11]]),
        })
        .collect();
    let next = order.u32(&data[entries_end..]);

    Ok(Ifd {
        fields,
        next,
        dirty: false,
    })
}

fn sub_ifd_offset(ifd: &Ifd, order: ByteOrder, tag: u16) -> Option<usize> {
    let field = ifd.get(tag)?;
    if !matches!(field.field_type, TYPE_LONG | TYPE_IFD) || field.count != 1 {
        return None;
    }
    let offset = match &field.payload {
        Payload::Original(word) => order.u32(word),
        Payload::Owned(bytes) if bytes.len() >= 4 => order.u32(bytes),
        Payload::Owned(_) => return None,
    };
    (offset != 0).then_some(offset as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built big-endian block: IFD0 with Make ("Canon"), Orientation and an
    /// Exif IFD holding ExposureTime.
    fn big_endian_block() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"MM");
        b.extend_from_slice(&42u16.to_be_bytes());
        b.extend_from_slice(&8u32.to_be_bytes());
        // IFD0 @ 8: 3 entries -> ends at 8 + 2 + 36 + 4 = 50
        b.extend_from_slice(&3u16.to_be_bytes());
        // Make, ASCII, 6, offset 50
        b.extend_from_slice(&0x010Fu16.to_be_bytes());
        b.extend_from_slice(&2u16.to_be_bytes());
        b.extend_from_slice(&6u32.to_be_bytes());
        b.extend_from_slice(&50u32.to_be_bytes());
        // Orientation, SHORT, 1, value 6
        b.extend_from_slice(&0x0112u16.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(&1u32.to_be_bytes());
        b.extend_from_slice(&[0, 6, 0, 0]);
        // ExifIFD pointer, LONG, 1, offset 56
        b.extend_from_slice(&0x8769u16.to_be_bytes());
        b.extend_from_slice(&4u16.to_be_bytes());
        b.extend_from_slice(&1u32.to_be_bytes());
        b.extend_from_slice(&56u32.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        // @50: "Canon\0"
        b.extend_from_slice(b"Canon\0");
        // Exif IFD @ 56: 1 entry, ExposureTime RATIONAL 1 @ 74
        b.extend_from_slice(&1u16.to_be_bytes());
        b.extend_from_slice(&0x829Au16.to_be_bytes());
        b.extend_from_slice(&5u16.to_be_bytes());
        b.extend_from_slice(&1u32.to_be_bytes());
        b.extend_from_slice(&74u32.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        // @74: 1/250
        b.extend_from_slice(&1u32.to_be_bytes());
        b.extend_from_slice(&250u32.to_be_bytes());
        b
    }

    #[test]
    fn parses_big_endian_block() {
        let block = TiffBlock::parse(&big_endian_block()).unwrap();
        assert_eq!(block.order, ByteOrder::Big);
        assert_eq!(block.entry_count(IfdKind::Primary), 3);
        assert_eq!(block.entry_count(IfdKind::Exif), 1);
        assert_eq!(block.entry_count(IfdKind::Gps), 0);
        assert_eq!(
            block.ascii(IfdKind::Primary, 0x010F).unwrap().as_deref(),
            Some("Canon")
        );
        assert_eq!(
            block.rationals(IfdKind::Exif, 0x829A).unwrap(),
            Some(vec![(1, 250)])
        );
    }

    #[test]
    fn untouched_block_serializes_unchanged() {
        let original = big_endian_block();
        let block = TiffBlock::parse(&original).unwrap();
        assert_eq!(block.to_bytes(), original);
    }

    #[test]
    fn edits_preserve_foreign_entries_and_byte_order() {
        let original = big_endian_block();
        let mut block = TiffBlock::parse(&original).unwrap();
        block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:00");
        block.set_ascii(IfdKind::Exif, TAG_DATE_TIME_ORIGINAL, "2024:05:01 10:00:00");
        block.set_rationals(IfdKind::Gps, TAG_GPS_LATITUDE, &[(40, 1), (25, 1), (0, 1)]);

        let bytes = block.to_bytes();
        assert_eq!(&bytes[..original.len()], &original[..]);
        assert_eq!(&bytes[0..2], b"MM");

        let reparsed = TiffBlock::parse(&bytes).unwrap();
        assert_eq!(reparsed.entry_count(IfdKind::Primary), 5);
        assert_eq!(reparsed.entry_count(IfdKind::Exif), 2);
        assert_eq!(
            reparsed.ascii(IfdKind::Primary, 0x010F).unwrap().as_deref(),
            Some("Canon")
        );
        assert_eq!(
            reparsed.rationals(IfdKind::Exif, 0x829A).unwrap(),
            Some(vec![(1, 250)])
        );
        assert_eq!(
            reparsed.ascii(IfdKind::Primary, TAG_DATE_TIME).unwrap().as_deref(),
            Some("2024:05:01 10:00:00")
        );
        assert_eq!(
            reparsed.rationals(IfdKind::Gps, TAG_GPS_LATITUDE).unwrap(),
            Some(vec![(40, 1), (25, 1), (0, 1)])
        );
    }

    #[test]
    fn rewritten_ifd_entries_are_sorted() {
        let mut block = TiffBlock::empty();
        block.set_ascii(IfdKind::Gps, TAG_GPS_DATE_STAMP, "2024:05:01");
        block.set_bytes(IfdKind::Gps, TAG_GPS_VERSION_ID, &[2, 2, 0, 0]);
        block.set_ascii(IfdKind::Gps, TAG_GPS_LATITUDE_REF, "N");
        let bytes = block.to_bytes();

        let reparsed = TiffBlock::parse(&bytes).unwrap();
        let gps = reparsed.gps.as_ref().unwrap();
        let tags: Vec<u16> = gps.fields.iter().map(|f| f.tag).collect();
        assert_eq!(
            tags,
            vec![TAG_GPS_VERSION_ID, TAG_GPS_LATITUDE_REF, TAG_GPS_DATE_STAMP]
        );
    }

    #[test]
    fn empty_block_gets_ifd0_after_header() {
        let mut block = TiffBlock::empty();
        block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:00");
        let bytes = block.to_bytes();
        assert_eq!(&bytes[0..4], b"II*\0");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 8);
        let reparsed = TiffBlock::parse(&bytes).unwrap();
        assert_eq!(reparsed.entry_count(IfdKind::Primary), 1);
    }

    #[test]
    fn setting_twice_keeps_one_entry() {
        let mut block = TiffBlock::empty();
        block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:00");
        block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:02 10:00:00");
        assert_eq!(block.entry_count(IfdKind::Primary), 1);
    }

    #[test]
    fn rewriting_current_values_leaves_block_unchanged() {
        let mut block = TiffBlock::empty();
        block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:00");
        block.set_rationals(IfdKind::Gps, TAG_GPS_LATITUDE, &[(40, 1), (25, 1), (0, 1)]);
        let bytes = block.to_bytes();

        let mut reparsed = TiffBlock::parse(&bytes).unwrap();
        reparsed.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:00");
        reparsed.set_rationals(IfdKind::Gps, TAG_GPS_LATITUDE, &[(40, 1), (25, 1), (0, 1)]);
        assert_eq!(reparsed.to_bytes(), bytes);

        reparsed.set_ascii(IfdKind::Primary, TAG_DATE_TIME, "2024:05:01 10:00:01");
        assert!(reparsed.to_bytes().len() > bytes.len());
    }

    #[test]
    fn rejects_malformed_blocks() {
        assert_eq!(TiffBlock::parse(b"II*\0").unwrap_err(), TiffError::TooShort(4));
        assert_eq!(
            TiffBlock::parse(b"XX*\0\x08\0\0\0").unwrap_err(),
            TiffError::ByteOrder
        );
        assert_eq!(
            TiffBlock::parse(b"II\x2b\0\x08\0\0\0").unwrap_err(),
            TiffError::Magic(43)
        );
        assert_eq!(
            TiffBlock::parse(b"II*\0\xff\0\0\0").unwrap_err(),
            TiffError::IfdOutOfBounds(255)
        );
    }

    #[test]
    fn out_of_bounds_value_is_reported_on_read() {
        let mut data = big_endian_block();
        // Point Make's value past the end of the block.
        data[18..22].copy_from_slice(&1000u32.to_be_bytes());
        let block = TiffBlock::parse(&data).unwrap();
        assert_eq!(
            block.ascii(IfdKind::Primary, 0x010F).unwrap_err(),
            TiffError::ValueOutOfBounds { tag: 0x010F }
        );
    }
}
