// Session control: one live session at a time, imports serialized through a
// single-flight flag, display requests validated before they reach the
// backend.

pub mod gateway;
pub mod indicator;
pub mod years;

use std::path::Path;

use log::{info, warn};

use crate::errors::TrailheatError;
use crate::heatmap::HeatmapLayerManager;
use gateway::{BackendGateway, SessionId};
use indicator::{IndicatorGuard, LoadingIndicator};
use years::{YearSelection, YearSelector};

/// Turns user actions into backend queries and map-layer mutations. Owns
/// the session identifier, the year selector, and the loading indicator;
/// the heatmap layer manager is passed in per operation so each keeps a
/// single owner.
pub struct SessionController<G: BackendGateway> {
    gateway: G,
    session: Option<SessionId>,
    years: YearSelector,
    indicator: LoadingIndicator,
    import_in_flight: bool,
}

impl<G: BackendGateway> SessionController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            session: None,
            years: YearSelector::default(),
            indicator: LoadingIndicator::default(),
            import_in_flight: false,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn years(&self) -> &YearSelector {
        &self.years
    }

    pub fn select_year(&mut self, selection: YearSelection) -> Result<(), TrailheatError> {
        self.years.select(selection)
    }

    pub fn is_busy(&self) -> bool {
        self.import_in_flight
    }

    pub fn indicator(&self) -> &LoadingIndicator {
        &self.indicator
    }

    /// Starts an import. The parse itself runs outside the controller (the
    /// UI hands the gateway to a worker thread); this only claims the
    /// single in-flight slot and shows the indicator. A second import while
    /// one is pending fails with `ImportInFlight`, so a superseded import
    /// can never commit over a newer one.
    pub fn begin_import(&mut self) -> Result<(), TrailheatError> {
        if self.import_in_flight {
            warn!("import requested while another import is pending");
            return Err(TrailheatError::ImportInFlight);
        }
        self.import_in_flight = true;
        self.indicator.show();
        Ok(())
    }

    /// Completes the import started with [`begin_import`]. The indicator is
    /// hidden and the in-flight slot released on every path. On success the
    /// new session, its year options, the default selection, and the unbound
    /// layer are committed together, after the year listing succeeds; any
    /// failure leaves the prior session untouched.
    ///
    /// [`begin_import`]: SessionController::begin_import
    pub fn finish_import(
        &mut self,
        outcome: Result<SessionId, TrailheatError>,
        layer: &mut HeatmapLayerManager,
    ) -> Result<(), TrailheatError> {
        self.import_in_flight = false;
        self.indicator.hide();

        let session = outcome?;
        let years = self.gateway.list_years(&session)?;

        info!("session {session} imported with {} years", years.len());
        self.years.populate(years);
        self.session = Some(session);
        layer.reset();
        Ok(())
    }

    /// Validates the current session and selection, then delegates to the
    /// layer manager. A selection that is neither a known year nor `All`
    /// never reaches the backend.
    pub fn request_display(
        &mut self,
        layer: &mut HeatmapLayerManager,
    ) -> Result<(), TrailheatError> {
        if self.import_in_flight {
            return Err(TrailheatError::ImportInFlight);
        }
        if let YearSelection::Year(year) = self.years.selection()
            && !self.years.selection_is_known()
        {
            return Err(TrailheatError::UnknownYear { year });
        }

        let _guard = IndicatorGuard::acquire(&mut self.indicator);
        layer.display(
            &self.gateway,
            self.session.as_ref(),
            Some(self.years.selection()),
        )
    }

    /// Writes the current session to an archive. Requires a live session;
    /// changes no local state.
    pub fn export_session(&mut self, path: &Path) -> Result<(), TrailheatError> {
        if self.import_in_flight {
            return Err(TrailheatError::ImportInFlight);
        }
        let session = self.session.as_ref().ok_or(TrailheatError::NoSession)?;

        let _guard = IndicatorGuard::acquire(&mut self.indicator);
        self.gateway.export_session(session, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::{HeatmapPoint, LayerState, MapView};
    use crate::session::gateway::tests::RecordingGateway;

    fn controller(gateway: RecordingGateway) -> SessionController<RecordingGateway> {
        SessionController::new(gateway)
    }

    fn layer() -> HeatmapLayerManager {
        HeatmapLayerManager::initialize(MapView::default())
    }

    fn one_point() -> Vec<HeatmapPoint> {
        vec![HeatmapPoint {
            lat: 45.5,
            lng: -73.5,
            count: 3,
        }]
    }

    #[test]
    fn test_display_without_session_records_no_query() {
        let mut controller = controller(RecordingGateway::default());
        let mut layer = layer();

        let result = controller.request_display(&mut layer);

        assert!(matches!(result, Err(TrailheatError::NoSession)));
        assert!(controller.gateway().recorded_calls().is_empty());
        assert!(!controller.indicator().is_visible());
    }

    #[test]
    fn test_successful_import_commits_session_and_years() {
        let mut controller =
            controller(RecordingGateway::default().with_years(vec![2021, 2022]));
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        assert!(controller.indicator().is_visible());

        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");

        assert!(controller.session().is_some());
        assert_eq!(controller.years().available(), &[2021, 2022]);
        assert_eq!(controller.years().selection(), YearSelection::All);
        assert!(!controller.indicator().is_visible());
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_failed_import_leaves_state_untouched() {
        let mut controller = controller(RecordingGateway::default());
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        let result = controller.finish_import(
            Err(TrailheatError::ImportIOError {
                source: std::io::Error::other("bad path"),
            }),
            &mut layer,
        );

        assert!(result.is_err());
        assert!(controller.session().is_none());
        assert!(controller.years().available().is_empty());
        assert!(!controller.indicator().is_visible());
        // year population must not run after a failed import
        assert!(controller.gateway().recorded_calls().is_empty());
    }

    #[test]
    fn test_failed_year_listing_keeps_prior_session() {
        let mut controller = controller(RecordingGateway::default().failing_year_listing());
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        let result = controller.finish_import(Ok(SessionId::new()), &mut layer);

        assert!(matches!(result, Err(TrailheatError::UnknownSession { .. })));
        assert!(controller.session().is_none());
        assert!(controller.years().available().is_empty());
    }

    #[test]
    fn test_second_import_is_rejected_while_pending() {
        let mut controller = controller(RecordingGateway::default());

        controller.begin_import().expect("no import pending");
        let result = controller.begin_import();

        assert!(matches!(result, Err(TrailheatError::ImportInFlight)));
    }

    #[test]
    fn test_display_is_rejected_while_import_pending() {
        let mut controller = controller(RecordingGateway::default());
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        let result = controller.request_display(&mut layer);

        assert!(matches!(result, Err(TrailheatError::ImportInFlight)));
        assert!(controller.gateway().recorded_calls().is_empty());
    }

    #[test]
    fn test_selecting_unknown_year_never_reaches_backend() {
        let mut controller = controller(
            RecordingGateway::default()
                .with_years(vec![2021])
                .with_year_points(2021, one_point()),
        );
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");

        let result = controller.select_year(YearSelection::Year(1999));

        assert!(matches!(
            result,
            Err(TrailheatError::UnknownYear { year: 1999 })
        ));
        // only the year listing from the import was recorded
        assert_eq!(
            controller.gateway().recorded_calls(),
            vec!["list_years".to_string()]
        );
    }

    #[test]
    fn test_display_binds_selected_year() {
        let mut controller = controller(
            RecordingGateway::default()
                .with_years(vec![2021])
                .with_year_points(2021, one_point()),
        );
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");
        controller
            .select_year(YearSelection::Year(2021))
            .expect("2021 is available");
        controller
            .request_display(&mut layer)
            .expect("display should bind");

        let dataset = layer.bound_dataset().expect("dataset bound");
        assert_eq!(dataset.points, one_point());
        assert!(!controller.indicator().is_visible());
    }

    #[test]
    fn test_reimport_resets_bound_layer() {
        let mut controller = controller(
            RecordingGateway::default()
                .with_years(vec![2021])
                .with_year_points(2021, one_point()),
        );
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");
        controller
            .request_display(&mut layer)
            .expect("display should bind");
        assert!(layer.bound_dataset().is_some());

        controller.begin_import().expect("no import pending");
        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");

        assert_eq!(*layer.state(), LayerState::Unbound);
    }

    #[test]
    fn test_export_requires_session() {
        let mut controller = controller(RecordingGateway::default());

        let result = controller.export_session(Path::new("/tmp/archive.jsonl"));

        assert!(matches!(result, Err(TrailheatError::NoSession)));
        assert!(controller.gateway().recorded_calls().is_empty());
    }

    #[test]
    fn test_export_changes_no_state() {
        let mut controller =
            controller(RecordingGateway::default().with_years(vec![2021]));
        let mut layer = layer();

        controller.begin_import().expect("no import pending");
        controller
            .finish_import(Ok(SessionId::new()), &mut layer)
            .expect("import should commit");
        let session_before = controller.session().cloned();

        controller
            .export_session(Path::new("/tmp/archive.jsonl"))
            .expect("export should succeed");

        assert_eq!(controller.session().cloned(), session_before);
        assert_eq!(controller.years().available(), &[2021]);
        assert!(!controller.indicator().is_visible());
    }
}
