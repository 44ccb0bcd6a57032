// In-process activity backend: parses GPX/FIT files into sessions held in
// memory and answers the year-listing and point queries the controller
// issues.

mod archive;
mod fit;
mod gpx;
mod paths;

use std::collections::HashMap;
use std::fs::{self, DirEntry};
use std::io::Error;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Datelike};
use itertools::Itertools;
use log::{debug, info};
use rayon::iter::{ParallelBridge, ParallelIterator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TrailheatError;
use crate::heatmap::HeatmapPoint;
use crate::session::gateway::{BackendGateway, SessionId};

/// One recorded position of an activity track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp_s: i64,
}

/// One imported activity file: its start time plus every recorded position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
    pub started_at_s: i64,
    pub points: Vec<TrackPoint>,
}

impl Activity {
    pub fn new(started_at_s: i64, points: Vec<TrackPoint>) -> Self {
        Self {
            started_at_s,
            points,
        }
    }

    /// Calendar year of the activity's start time. Activities with a
    /// timestamp outside the representable range are dropped at bucketing.
    fn start_year(&self) -> Option<i32> {
        Some(DateTime::from_timestamp(self.started_at_s, 0)?.year())
    }
}

struct SessionData {
    by_year: HashMap<i32, Vec<Activity>>,
}

/// Backend store for imported sessions, keyed by an opaque id. One running
/// application holds every session in memory; re-importing simply creates a
/// new session and the controller forgets the old id.
#[derive(Default)]
pub struct ActivityStore {
    sessions: Mutex<HashMap<Uuid, SessionData>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_session(&self, activities: Vec<Activity>) -> SessionId {
        let session = SessionId::new();
        let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
        sessions.insert(
            *session.as_uuid(),
            SessionData {
                by_year: bucket_by_year(activities),
            },
        );
        session
    }

    fn with_session<R>(
        &self,
        session: &SessionId,
        read: impl FnOnce(&SessionData) -> R,
    ) -> Result<R, TrailheatError> {
        let sessions = self.sessions.lock().expect("sessions mutex poisoned");
        let data = sessions
            .get(session.as_uuid())
            .ok_or_else(|| TrailheatError::UnknownSession {
                session: session.to_string(),
            })?;
        Ok(read(data))
    }
}

impl BackendGateway for ActivityStore {
    fn import_directory(&self, path: &Path) -> Result<SessionId, TrailheatError> {
        let started = Instant::now();
        let entries =
            fs::read_dir(path).map_err(|e| TrailheatError::ImportIOError { source: e })?;

        let activities: Vec<Activity> = entries
            .into_iter()
            .par_bridge()
            .flat_map(parse_dir_entry)
            .collect();

        info!(
            "imported {} activities from {} in {:.2?}",
            activities.len(),
            path.display(),
            started.elapsed()
        );

        Ok(self.insert_session(activities))
    }

    fn import_archive(&self, path: &Path) -> Result<SessionId, TrailheatError> {
        let activities = archive::read_archive(path)?;
        info!(
            "imported {} activities from archive {}",
            activities.len(),
            path.display()
        );
        Ok(self.insert_session(activities))
    }

    fn export_session(&self, session: &SessionId, path: &Path) -> Result<(), TrailheatError> {
        let activities = self.with_session(session, |data| {
            data.by_year
                .keys()
                .copied()
                .sorted()
                .flat_map(|year| data.by_year[&year].iter().cloned())
                .collect::<Vec<_>>()
        })?;
        archive::write_archive(path, &activities)?;
        info!(
            "exported {} activities to {}",
            activities.len(),
            path.display()
        );
        Ok(())
    }

    fn list_years(&self, session: &SessionId) -> Result<Vec<i32>, TrailheatError> {
        self.with_session(session, |data| {
            data.by_year.keys().copied().sorted().collect()
        })
    }

    fn query_year(
        &self,
        session: &SessionId,
        year: i32,
    ) -> Result<Vec<HeatmapPoint>, TrailheatError> {
        self.with_session(session, |data| {
            data.by_year
                .get(&year)
                .map(|activities| flatten_points(activities.iter()))
                .unwrap_or_default()
        })
    }

    fn query_all_years(&self, session: &SessionId) -> Result<Vec<HeatmapPoint>, TrailheatError> {
        self.with_session(session, |data| {
            let activities = data
                .by_year
                .keys()
                .copied()
                .sorted()
                .flat_map(|year| data.by_year[&year].iter());
            flatten_points(activities)
        })
    }
}

fn flatten_points<'a>(activities: impl Iterator<Item = &'a Activity>) -> Vec<HeatmapPoint> {
    activities
        .flat_map(|activity| activity.points.iter())
        .map(|point| HeatmapPoint {
            lat: point.lat,
            lng: point.lng,
            count: 1,
        })
        .collect()
}

fn bucket_by_year(activities: Vec<Activity>) -> HashMap<i32, Vec<Activity>> {
    activities
        .into_iter()
        .filter_map(|activity| Some((activity.start_year()?, activity)))
        .into_group_map()
}

fn parse_dir_entry(dir_entry: Result<DirEntry, Error>) -> Option<Activity> {
    let path = dir_entry.ok()?.path();
    if !path.is_file() {
        return None;
    }

    let points: Vec<TrackPoint>;
    if paths::path_contains_any(&path, &["fit.gz", ".fit"]) {
        points = fit::parse_fit_file(&path)?;
    } else if paths::path_contains(&path, "gpx") {
        points = gpx::parse_gpx_file(&path)?;
    } else {
        debug!("skipping unsupported file {}", path.display());
        return None;
    }

    if points.is_empty() {
        return None;
    }

    Some(Activity::new(points.first()?.timestamp_s, points))
}
