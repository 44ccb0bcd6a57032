// Error types for trailheat

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TrailheatError {
    // Validation errors raised before any backend call
    #[snafu(display("No activities loaded"))]
    NoSession,
    #[snafu(display("No year selected"))]
    NoYearSelected,
    #[snafu(display("Year {year} is not part of the loaded activities"))]
    UnknownYear { year: i32 },
    #[snafu(display("Another import is still running"))]
    ImportInFlight,

    // Raised after a successful query whose payload is empty
    #[snafu(display("No activities found"))]
    NoActivitiesFound,

    // Errors from the activity store
    #[snafu(display("Unknown session: {session}"))]
    UnknownSession { session: String },
    #[snafu(display("Error reading activity directory"))]
    ImportIOError { source: io::Error },
    #[snafu(display("Error reading session archive"))]
    ArchiveReadError { source: io::Error },
    #[snafu(display("Invalid session archive: {path}"))]
    InvalidArchiveError { path: String },
    #[snafu(display("Error writing session archive"))]
    ArchiveWriteError { source: io::Error },
    #[snafu(display("Import worker stopped before returning a result"))]
    ImportWorkerError,

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl TrailheatError {
    /// Whether the error comes from local validation rather than a failed
    /// backend operation. Validation failures are surfaced as warnings.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrailheatError::NoSession
                | TrailheatError::NoYearSelected
                | TrailheatError::UnknownYear { .. }
                | TrailheatError::ImportInFlight
                | TrailheatError::NoActivitiesFound
        )
    }
}
