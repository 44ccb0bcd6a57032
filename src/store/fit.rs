use std::fs::{File, read};
use std::io::{BufReader, Read};
use std::path::Path;

use fitparser::profile::MesgNum;
use fitparser::{FitDataField, FitDataRecord};
use flate2::bufread::GzDecoder;

use super::TrackPoint;
use super::paths::path_contains;

/// FIT encodes coordinates as 32-bit semicircles.
const SEMICIRCLES_TO_DEGREES: f64 = 180f64 / (2u32 << 30) as f64;

/// Reads the Record messages of a FIT file, decompressing `.fit.gz` first.
/// Records without a position are skipped.
pub(crate) fn parse_fit_file(path: &Path) -> Option<Vec<TrackPoint>> {
    let bytes: Vec<u8>;
    if path_contains(path, ".fit.gz") {
        bytes = extract_gunzip_file(path).ok()?;
    } else if path_contains(path, ".fit") {
        bytes = read(path).ok()?;
    } else {
        return None;
    }

    let points = fitparser::from_bytes(bytes.as_slice())
        .ok()?
        .iter()
        .filter(|record| record.kind() == MesgNum::Record)
        .flat_map(track_point_from_record)
        .collect();

    Some(points)
}

fn extract_gunzip_file(path: &Path) -> Result<Vec<u8>, std::io::Error> {
    let mut bytes = Vec::new();
    let file = File::open(path)?;
    let buf_reader = BufReader::new(file);
    let mut gz_file = GzDecoder::new(buf_reader);
    gz_file.read_to_end(&mut bytes)?;

    Ok(bytes)
}

fn track_point_from_record(record: &FitDataRecord) -> Option<TrackPoint> {
    let lat = semicircles_to_degrees(find_value(record.fields(), "position_lat"))?;
    let lng = semicircles_to_degrees(find_value(record.fields(), "position_long"))?;
    let timestamp_s = find_value(record.fields(), "timestamp").unwrap_or(0);

    Some(TrackPoint {
        lat,
        lng,
        timestamp_s,
    })
}

fn find_value(fields: &[FitDataField], field_name: &str) -> Option<i64> {
    fields
        .iter()
        .find(|field| field.name() == field_name)
        .and_then(|field| field.value().try_into().ok())
}

fn semicircles_to_degrees(semicircles: Option<i64>) -> Option<f64> {
    semicircles.map(|value| value as f64 * SEMICIRCLES_TO_DEGREES)
}
