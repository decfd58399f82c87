//! Mapping between [`MetadataTagSet`] entries and TIFF fields.

use super::error::TiffError;
use super::tags::{MetadataTagSet, TagName, TagValue};
use super::tiff::*;

/// Seconds are stored with four decimal places (≈3 mm of arc).
const SECOND_DENOMINATOR: u32 = 10_000;
const UNITS_PER_MINUTE: u64 = 60 * SECOND_DENOMINATOR as u64;
const UNITS_PER_DEGREE: u64 = 60 * UNITS_PER_MINUTE;
const ALTITUDE_DENOMINATOR: u32 = 1000;
const GPS_VERSION: [u8; 4] = [2, 2, 0, 0];

/// Write every tag of the set into the block, replacing same-named fields.
pub(crate) fn encode_tags(block: &mut TiffBlock, tags: &MetadataTagSet) {
    for (name, value) in tags.iter() {
        match (name, value) {
            (TagName::DateTime, TagValue::Text(s)) => {
                block.set_ascii(IfdKind::Primary, TAG_DATE_TIME, s)
            }
            (TagName::DateTimeOriginal, TagValue::Text(s)) => {
                block.set_ascii(IfdKind::Exif, TAG_DATE_TIME_ORIGINAL, s)
            }
            (TagName::DateTimeDigitized, TagValue::Text(s)) => {
                block.set_ascii(IfdKind::Exif, TAG_DATE_TIME_DIGITIZED, s)
            }
            (TagName::GPSLatitude, TagValue::Degrees(d)) => {
                let reference = if *d < 0.0 { "S" } else { "N" };
                block.set_ascii(IfdKind::Gps, TAG_GPS_LATITUDE_REF, reference);
                block.set_rationals(IfdKind::Gps, TAG_GPS_LATITUDE, &degrees_to_dms(*d));
            }
            (TagName::GPSLongitude, TagValue::Degrees(d)) => {
                let reference = if *d < 0.0 { "W" } else { "E" };
                block.set_ascii(IfdKind::Gps, TAG_GPS_LONGITUDE_REF, reference);
                block.set_rationals(IfdKind::Gps, TAG_GPS_LONGITUDE, &degrees_to_dms(*d));
            }
            (TagName::GPSAltitude, TagValue::Meters(m)) => {
                let below_sea_level = u8::from(*m < 0.0);
                let millimeters = (m.abs() * ALTITUDE_DENOMINATOR as f64).round() as u32;
                block.set_bytes(IfdKind::Gps, TAG_GPS_ALTITUDE_REF, &[below_sea_level]);
                block.set_rationals(
                    IfdKind::Gps,
                    TAG_GPS_ALTITUDE,
                    &[(millimeters, ALTITUDE_DENOMINATOR)],
                );
            }
            (TagName::GPSDateStamp, TagValue::Text(s)) => {
                block.set_ascii(IfdKind::Gps, TAG_GPS_DATE_STAMP, s)
            }
            (TagName::GPSTimeStamp, TagValue::Text(s)) => match parse_hms(s) {
                Some([h, m, sec]) => block.set_rationals(
                    IfdKind::Gps,
                    TAG_GPS_TIME_STAMP,
                    &[(h, 1), (m, 1), (sec, 1)],
                ),
                None => log::warn!("Skipping malformed GPSTimeStamp {s:?}"),
            },
            (name, value) => log::warn!("Skipping {name}: unexpected value {value:?}"),
        }
    }

    if tags.has_gps() {
        block.set_bytes(IfdKind::Gps, TAG_GPS_VERSION_ID, &GPS_VERSION);
    }
}

/// Decode the recognized tags present in the block.
///
/// Values that decode but do not pass [`MetadataTagSet`] validation (e.g. a
/// camera writing blank date strings) are skipped rather than failing the read.
pub(crate) fn decode_tags(block: &TiffBlock) -> Result<MetadataTagSet, TiffError> {
    let mut tags = MetadataTagSet::new();

    let text_tags = [
        (TagName::DateTime, IfdKind::Primary, TAG_DATE_TIME),
        (TagName::DateTimeOriginal, IfdKind::Exif, TAG_DATE_TIME_ORIGINAL),
        (TagName::DateTimeDigitized, IfdKind::Exif, TAG_DATE_TIME_DIGITIZED),
        (TagName::GPSDateStamp, IfdKind::Gps, TAG_GPS_DATE_STAMP),
    ];
    for (name, kind, tag) in text_tags {
        if let Some(text) = block.ascii(kind, tag)? {
            keep(&mut tags, name, TagValue::Text(text));
        }
    }

    let coordinates = [
        (TagName::GPSLatitude, TAG_GPS_LATITUDE, TAG_GPS_LATITUDE_REF, 'S'),
        (TagName::GPSLongitude, TAG_GPS_LONGITUDE, TAG_GPS_LONGITUDE_REF, 'W'),
    ];
    for (name, tag, ref_tag, negative_ref) in coordinates {
        let Some(degrees) = block.rationals(IfdKind::Gps, tag)?.and_then(|v| dms_to_degrees(&v))
        else {
            continue;
        };
        let negative = block
            .ascii(IfdKind::Gps, ref_tag)?
            .is_some_and(|r| r.starts_with(negative_ref));
        keep(&mut tags, name, TagValue::Degrees(if negative { -degrees } else { degrees }));
    }

    if let Some(meters) = block
        .rationals(IfdKind::Gps, TAG_GPS_ALTITUDE)?
        .and_then(|v| v.first().copied())
        .and_then(rational)
    {
        let below = block.byte(IfdKind::Gps, TAG_GPS_ALTITUDE_REF)? == Some(1);
        keep(&mut tags, TagName::GPSAltitude, TagValue::Meters(if below { -meters } else { meters }));
    }

    if let Some(parts) = block.rationals(IfdKind::Gps, TAG_GPS_TIME_STAMP)? {
        let hms: Option<Vec<f64>> = parts.iter().copied().map(rational).collect();
        match hms.as_deref() {
            Some([h, m, s]) => {
                let text = format!("{:02}:{:02}:{:02}", *h as u32, *m as u32, *s as u32);
                keep(&mut tags, TagName::GPSTimeStamp, TagValue::Text(text));
            }
            _ => log::debug!("Ignoring malformed GPSTimeStamp"),
        }
    }

    Ok(tags)
}

fn keep(tags: &mut MetadataTagSet, name: TagName, value: TagValue) {
    if let Err(e) = tags.insert(name, value) {
        log::debug!("Ignoring {name}: {e}");
    }
}

fn rational((numerator, denominator): (u32, u32)) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

/// Decimal degrees to degrees/minutes/seconds rationals.
///
/// The value is quantized once to 1/10000 of an arc second and split with
/// integer arithmetic, so decoding and re-encoding reproduces the same rationals.
pub(crate) fn degrees_to_dms(degrees: f64) -> [(u32, u32); 3] {
    let units = (degrees.abs() * UNITS_PER_DEGREE as f64).round() as u64;
    let whole_degrees = units / UNITS_PER_DEGREE;
    let remainder = units % UNITS_PER_DEGREE;
    let minutes = remainder / UNITS_PER_MINUTE;
    let seconds = remainder % UNITS_PER_MINUTE;
    [
        (whole_degrees as u32, 1),
        (minutes as u32, 1),
        (seconds as u32, SECOND_DENOMINATOR),
    ]
}

/// Degrees/minutes/seconds rationals to unsigned decimal degrees.
pub(crate) fn dms_to_degrees(dms: &[(u32, u32)]) -> Option<f64> {
    let [d, m, s] = dms else {
        return None;
    };
    Some(rational(*d)? + rational(*m)? / 60.0 + rational(*s)? / 3600.0)
}

fn parse_hms(text: &str) -> Option<[u32; 3]> {
    let mut parts = text.split(':').map(|p| p.parse::<u32>().ok());
    let hms = [parts.next()??, parts.next()??, parts.next()??];
    parts.next().is_none().then_some(hms)
}
