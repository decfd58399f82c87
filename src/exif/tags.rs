use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::TagError;
use crate::location::{GeoPoint, LocationFix};

/// `YYYY:MM:DD HH:MM:SS`, 24-hour, zero-padded, no timezone.
pub const DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y:%m:%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// The tags this crate reads and writes. Everything else in a container is
/// carried through untouched.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TagName {
    DateTime,
    DateTimeOriginal,
    DateTimeDigitized,
    GPSLatitude,
    GPSLongitude,
    GPSAltitude,
    GPSDateStamp,
    GPSTimeStamp,
}

impl TagName {
    pub const ALL: [TagName; 8] = [
        TagName::DateTime,
        TagName::DateTimeOriginal,
        TagName::DateTimeDigitized,
        TagName::GPSLatitude,
        TagName::GPSLongitude,
        TagName::GPSAltitude,
        TagName::GPSDateStamp,
        TagName::GPSTimeStamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagName::DateTime => "DateTime",
            TagName::DateTimeOriginal => "DateTimeOriginal",
            TagName::DateTimeDigitized => "DateTimeDigitized",
            TagName::GPSLatitude => "GPSLatitude",
            TagName::GPSLongitude => "GPSLongitude",
            TagName::GPSAltitude => "GPSAltitude",
            TagName::GPSDateStamp => "GPSDateStamp",
            TagName::GPSTimeStamp => "GPSTimeStamp",
        }
    }

    pub fn is_gps(&self) -> bool {
        matches!(
            self,
            TagName::GPSLatitude
                | TagName::GPSLongitude
                | TagName::GPSAltitude
                | TagName::GPSDateStamp
                | TagName::GPSTimeStamp
        )
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagName {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TagError::UnknownTag(s.to_string()))
    }
}

/// A tag value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Date, time or date-time text in EXIF notation.
    Text(String),
    /// Signed decimal degrees (negative = south / west).
    Degrees(f64),
    /// Signed meters (negative = below sea level).
    Meters(f64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(s) => f.write_str(s),
            TagValue::Degrees(d) => write!(f, "{d:.6}"),
            TagValue::Meters(m) => write!(f, "{m:.3} m"),
        }
    }
}

/// A validated mapping from recognized tag to value.
///
/// Insertion checks that the value has the right kind for the tag, that text
/// values follow the EXIF notation exactly, and that coordinates are in range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataTagSet {
    tags: BTreeMap<TagName, TagValue>,
}

impl MetadataTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag set written for a capture taken at `captured_at`.
    ///
    /// The three `DateTime*` tags always carry the capture wall clock. GPS tags
    /// are added only when a fix is supplied; `GPSDateStamp`/`GPSTimeStamp` use
    /// the capture wall clock as well, not the fix's own timestamp.
    pub fn for_capture(captured_at: NaiveDateTime, fix: Option<&LocationFix>) -> Self {
        let stamp = captured_at.format(DATE_TIME_FORMAT).to_string();
        let mut tags = BTreeMap::new();
        for name in [
            TagName::DateTime,
            TagName::DateTimeOriginal,
            TagName::DateTimeDigitized,
        ] {
            tags.insert(name, TagValue::Text(stamp.clone()));
        }

        match fix {
            Some(fix) if fix.is_valid() => {
                tags.insert(TagName::GPSLatitude, TagValue::Degrees(fix.latitude));
                tags.insert(TagName::GPSLongitude, TagValue::Degrees(fix.longitude));
                if let Some(altitude) = fix.altitude {
                    tags.insert(TagName::GPSAltitude, TagValue::Meters(altitude));
                }
                tags.insert(
                    TagName::GPSDateStamp,
                    TagValue::Text(captured_at.format(DATE_FORMAT).to_string()),
                );
                tags.insert(
                    TagName::GPSTimeStamp,
                    TagValue::Text(captured_at.format(TIME_FORMAT).to_string()),
                );
            }
            Some(fix) => {
                log::warn!(
                    "Ignoring out-of-range location fix ({}, {})",
                    fix.latitude,
                    fix.longitude
                );
            }
            None => {}
        }

        Self { tags }
    }

    /// Insert a value, replacing any previous one. Returns the replaced value.
    pub fn insert(&mut self, name: TagName, value: TagValue) -> Result<Option<TagValue>, TagError> {
        validate(name, &value)?;
        Ok(self.tags.insert(name, value))
    }

    pub fn get(&self, name: TagName) -> Option<&TagValue> {
        self.tags.get(&name)
    }

    pub fn text(&self, name: TagName) -> Option<&str> {
        match self.tags.get(&name) {
            Some(TagValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a coordinate or altitude tag.
    pub fn number(&self, name: TagName) -> Option<f64> {
        match self.tags.get(&name) {
            Some(TagValue::Degrees(v)) | Some(TagValue::Meters(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn remove(&mut self, name: TagName) -> Option<TagValue> {
        self.tags.remove(&name)
    }

    pub fn contains(&self, name: TagName) -> bool {
        self.tags.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagName, &TagValue)> {
        self.tags.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn has_gps(&self) -> bool {
        self.tags.keys().any(TagName::is_gps)
    }

    /// The capture date-time, preferring `DateTime` over the original and
    /// digitized variants.
    pub fn date_time(&self) -> Option<&str> {
        self.text(TagName::DateTime)
            .or_else(|| self.text(TagName::DateTimeOriginal))
            .or_else(|| self.text(TagName::DateTimeDigitized))
    }

    /// Latitude and longitude together, or nothing.
    pub fn geo_point(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            latitude: self.number(TagName::GPSLatitude)?,
            longitude: self.number(TagName::GPSLongitude)?,
            altitude: self.number(TagName::GPSAltitude),
        })
    }
}

fn validate(name: TagName, value: &TagValue) -> Result<(), TagError> {
    let wrong_kind = |expected| TagError::WrongKind {
        tag: name.to_string(),
        expected,
    };
    let bad_format = |value: &str, format| TagError::BadFormat {
        tag: name.to_string(),
        value: value.to_string(),
        format,
    };
    let out_of_range = |value| TagError::OutOfRange {
        tag: name.to_string(),
        value,
    };

    match name {
        TagName::DateTime | TagName::DateTimeOriginal | TagName::DateTimeDigitized => {
            let TagValue::Text(s) = value else {
                return Err(wrong_kind("text"));
            };
            if s.len() != 19 || NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).is_err() {
                return Err(bad_format(s, "YYYY:MM:DD HH:MM:SS"));
            }
        }
        TagName::GPSDateStamp => {
            let TagValue::Text(s) = value else {
                return Err(wrong_kind("text"));
            };
            if s.len() != 10 || NaiveDate::parse_from_str(s, DATE_FORMAT).is_err() {
                return Err(bad_format(s, "YYYY:MM:DD"));
            }
        }
        TagName::GPSTimeStamp => {
            let TagValue::Text(s) = value else {
                return Err(wrong_kind("text"));
            };
            if s.len() != 8 || NaiveTime::parse_from_str(s, TIME_FORMAT).is_err() {
                return Err(bad_format(s, "HH:MM:SS"));
            }
        }
        TagName::GPSLatitude | TagName::GPSLongitude => {
            let TagValue::Degrees(d) = value else {
                return Err(wrong_kind("decimal degrees"));
            };
            let limit = if name == TagName::GPSLatitude { 90.0 } else { 180.0 };
            if !d.is_finite() || d.abs() > limit {
                return Err(out_of_range(*d));
            }
        }
        TagName::GPSAltitude => {
            let TagValue::Meters(m) = value else {
                return Err(wrong_kind("meters"));
            };
            // GPSAltitude is a single unsigned rational in millimeters.
            if !m.is_finite() || m.abs() * 1000.0 > u32::MAX as f64 {
                return Err(out_of_range(*m));
            }
        }
    }
    Ok(())
}
