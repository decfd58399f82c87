use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

use crate::location::GeoPoint;

/// Camera-side EXIF fields shown by `show`, read with a general-purpose parser.
///
/// This is independent of [`MetadataWriter::read_tags`](super::MetadataWriter::read_tags)
/// and doubles as a check that stamped files are readable by other tools.
#[derive(Debug, Clone, Default)]
pub struct ExifSummary {
    pub make: Option<String>,
    pub model: Option<String>,
    pub date_time_original: Option<String>,
    pub gps: Option<GeoPoint>,
}

/// Read a summary of the EXIF data in an image file.
pub fn read_summary(path: &Path) -> Result<ExifSummary> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(ExifSummary::default());
        }
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    let mut summary = ExifSummary {
        make: exif.get(ExifTag::Make).and_then(entry_to_string),
        model: exif.get(ExifTag::Model).and_then(entry_to_string),
        date_time_original: exif.get(ExifTag::DateTimeOriginal).and_then(entry_to_string),
        gps: None,
    };

    if let Some(gps) = gps_info {
        let altitude = (gps.altitude.1 != 0).then(|| {
            let meters = gps.altitude.0 as f64 / gps.altitude.1 as f64;
            if gps.altitude_ref == 1 { -meters } else { meters }
        });
        summary.gps = Some(GeoPoint {
            latitude: latlng_to_decimal(&gps.latitude, gps.latitude_ref),
            longitude: latlng_to_decimal(&gps.longitude, gps.longitude_ref),
            altitude,
        });
    }

    Ok(summary)
}

fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0.0 as f64 / latlng.0.1 as f64;
    let minutes = latlng.1.0 as f64 / latlng.1.1 as f64;
    let seconds = latlng.2.0 as f64 / latlng.2.1 as f64;

    let coord = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == 'S' || reference == 'W' { -coord } else { coord }
}
