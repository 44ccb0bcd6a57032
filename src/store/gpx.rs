use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::DateTime;
use gpx::{Gpx, Waypoint};

use super::TrackPoint;

/// Reads the first track segment of a GPX file. Files without tracks or
/// without timestamped positions yield `None` and are skipped by the
/// importer.
pub(crate) fn parse_gpx_file(path: &Path) -> Option<Vec<TrackPoint>> {
    let file = File::open(path).ok()?;
    let buf_reader = BufReader::new(file);
    let gpx: Gpx = gpx::read(buf_reader).ok()?;

    if gpx.tracks.is_empty() {
        return None;
    }

    let points = gpx.tracks[0].segments[0]
        .points
        .iter()
        .flat_map(track_point_from_waypoint)
        .collect();

    Some(points)
}

fn track_point_from_waypoint(waypoint: &Waypoint) -> Option<TrackPoint> {
    let lat = waypoint.point().y();
    let lng = waypoint.point().x();
    let timestamp_s = DateTime::parse_from_rfc3339(&waypoint.time?.format().ok()?)
        .ok()?
        .timestamp();

    Some(TrackPoint {
        lat,
        lng,
        timestamp_s,
    })
}
