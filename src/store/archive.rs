// Session archives are JSON-lines files with one activity per line, so an
// exported session can be re-imported without the source GPX/FIT files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::TrailheatError;

use super::Activity;

pub(crate) fn write_archive(path: &Path, activities: &[Activity]) -> Result<(), TrailheatError> {
    let archive_file =
        File::create(path).map_err(|e| TrailheatError::ArchiveWriteError { source: e })?;
    let mut archive_writer = BufWriter::new(archive_file);
    for activity in activities {
        let line = serde_json::to_string(activity)
            .map_err(|e| TrailheatError::ArchiveWriteError { source: e.into() })?;
        writeln!(archive_writer, "{line}")
            .map_err(|e| TrailheatError::ArchiveWriteError { source: e })?;
    }
    archive_writer
        .flush()
        .map_err(|e| TrailheatError::ArchiveWriteError { source: e })?;
    Ok(())
}

pub(crate) fn read_archive(path: &Path) -> Result<Vec<Activity>, TrailheatError> {
    let activities = serde_jsonlines::json_lines(path)
        .map_err(|e| TrailheatError::ArchiveReadError { source: e })?
        .collect::<Result<Vec<Activity>, std::io::Error>>()
        .map_err(|_| TrailheatError::InvalidArchiveError {
            path: format!("{}", path.display()),
        })?;
    Ok(activities)
}
