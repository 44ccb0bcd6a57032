use std::fmt;
use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::errors::TrailheatError;
use crate::heatmap::HeatmapPoint;

/// Opaque identifier for one imported batch of activities. The backend owns
/// every other piece of session state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Request/response interface to the service that parses, stores, and
/// queries imported activities. The controller and layer manager only talk
/// to the backend through this trait, so tests can drive them with a mock
/// and the UI can hand the real store to a worker thread.
pub trait BackendGateway {
    /// Parses every supported activity file in `path` into a new session.
    fn import_directory(&self, path: &Path) -> Result<SessionId, TrailheatError>;

    /// Loads a previously exported archive into a new session.
    fn import_archive(&self, path: &Path) -> Result<SessionId, TrailheatError>;

    /// Writes the session's activities to an archive at `path`.
    fn export_session(&self, session: &SessionId, path: &Path) -> Result<(), TrailheatError>;

    /// Years with at least one activity, ascending. Idempotent for a given
    /// session id.
    fn list_years(&self, session: &SessionId) -> Result<Vec<i32>, TrailheatError>;

    fn query_year(
        &self,
        session: &SessionId,
        year: i32,
    ) -> Result<Vec<HeatmapPoint>, TrailheatError>;

    fn query_all_years(&self, session: &SessionId) -> Result<Vec<HeatmapPoint>, TrailheatError>;
}

// The UI shares one store between the controller and the import worker
// thread through an Arc.
impl<G: BackendGateway + ?Sized> BackendGateway for Arc<G> {
    fn import_directory(&self, path: &Path) -> Result<SessionId, TrailheatError> {
        (**self).import_directory(path)
    }

    fn import_archive(&self, path: &Path) -> Result<SessionId, TrailheatError> {
        (**self).import_archive(path)
    }

    fn export_session(&self, session: &SessionId, path: &Path) -> Result<(), TrailheatError> {
        (**self).export_session(session, path)
    }

    fn list_years(&self, session: &SessionId) -> Result<Vec<i32>, TrailheatError> {
        (**self).list_years(session)
    }

    fn query_year(
        &self,
        session: &SessionId,
        year: i32,
    ) -> Result<Vec<HeatmapPoint>, TrailheatError> {
        (**self).query_year(session, year)
    }

    fn query_all_years(&self, session: &SessionId) -> Result<Vec<HeatmapPoint>, TrailheatError> {
        (**self).query_all_years(session)
    }
}
