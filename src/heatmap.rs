// Heatmap layer management: owns the dataset bound to the map overlay and
// decides which query results are allowed to replace it.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::TrailheatError;
use crate::session::gateway::{BackendGateway, SessionId};
use crate::session::years::YearSelection;

/// Display-scale upper bound bound into the overlay, independent of the
/// actual point counts.
pub const DISPLAY_MAX: f32 = 8.0;
/// Display-scale lower bound.
pub const DISPLAY_MIN: f32 = 0.0;

/// One geographic coordinate paired with an intensity count, the unit of
/// heatmap rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    pub count: u32,
}

/// The structure bound into the rendering layer. `max`/`min` are display
/// bounds, not derived from the data.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapDataset {
    pub points: Vec<HeatmapPoint>,
    pub max: f32,
    pub min: f32,
}

impl HeatmapDataset {
    pub(crate) fn with_display_bounds(points: Vec<HeatmapPoint>) -> Self {
        Self {
            points,
            max: DISPLAY_MAX,
            min: DISPLAY_MIN,
        }
    }
}

/// Rendering state of the overlay. `Bound` is only ever entered with a
/// non-empty point set.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LayerState {
    #[default]
    Unbound,
    Bound(HeatmapDataset),
}

/// Visual configuration of the density overlay.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Disc radius in degrees of latitude.
    pub radius: f64,
    pub max_opacity: f32,
    /// Scale the disc radius with the map zoom instead of keeping a fixed
    /// pixel size.
    pub scale_radius: bool,
    pub use_local_extrema: bool,
    pub blur: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            radius: 0.0004,
            max_opacity: 0.6,
            scale_radius: true,
            use_local_extrema: false,
            blur: 1.0,
        }
    }
}

/// Base tile layer configuration: URL template plus zoom ceiling.
#[derive(Clone, Debug)]
pub struct TileLayerConfig {
    pub url_template: &'static str,
    pub max_zoom: u8,
    pub attribution_text: &'static str,
    pub attribution_url: &'static str,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            max_zoom: 19,
            attribution_text: "© OpenStreetMap contributors",
            attribution_url: "https://www.openstreetmap.org/copyright",
        }
    }
}

/// Initial viewport of the map surface.
#[derive(Clone, Copy, Debug)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center_lat: 45.5,
            center_lng: -73.5,
            zoom: 10.0,
        }
    }
}

/// Owns the overlay state and mediates every data bind so that invalid
/// states are never rendered: a query returning no points leaves the
/// previously bound dataset in place.
pub struct HeatmapLayerManager {
    state: LayerState,
    overlay: OverlayConfig,
    tile_layer: TileLayerConfig,
    view: MapView,
}

impl HeatmapLayerManager {
    /// Builds the manager with the fixed visual configuration. The map
    /// surface itself is constructed by the UI from [`tile_layer`] and
    /// [`view`]; it re-projects every frame, so there is no deferred
    /// layout-invalidation pass to schedule.
    ///
    /// [`tile_layer`]: HeatmapLayerManager::tile_layer
    /// [`view`]: HeatmapLayerManager::view
    pub fn initialize(view: MapView) -> Self {
        Self {
            state: LayerState::Unbound,
            overlay: OverlayConfig::default(),
            tile_layer: TileLayerConfig::default(),
            view,
        }
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    /// The dataset currently bound into the overlay, if any.
    pub fn bound_dataset(&self) -> Option<&HeatmapDataset> {
        match &self.state {
            LayerState::Unbound => None,
            LayerState::Bound(dataset) => Some(dataset),
        }
    }

    pub fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }

    pub fn tile_layer(&self) -> &TileLayerConfig {
        &self.tile_layer
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    /// Queries the backend for the selected year (or all years) and binds
    /// the result into the overlay.
    ///
    /// Fails with `NoSession`/`NoYearSelected` before touching the backend
    /// when either precondition is missing. An empty payload fails with
    /// `NoActivitiesFound` and leaves the current state untouched, so a
    /// previously rendered heatmap stays visible.
    pub fn display<G: BackendGateway>(
        &mut self,
        gateway: &G,
        session: Option<&SessionId>,
        selection: Option<YearSelection>,
    ) -> Result<(), TrailheatError> {
        let session = session.ok_or(TrailheatError::NoSession)?;
        let selection = selection.ok_or(TrailheatError::NoYearSelected)?;

        let points = match selection {
            YearSelection::All => gateway.query_all_years(session)?,
            YearSelection::Year(year) => gateway.query_year(session, year)?,
        };

        if points.is_empty() {
            debug!("empty payload for {selection:?}, keeping current layer state");
            return Err(TrailheatError::NoActivitiesFound);
        }

        info!("binding {} points for {selection:?}", points.len());
        self.state = LayerState::Bound(HeatmapDataset::with_display_bounds(points));
        Ok(())
    }

    /// Drops the bound dataset. Only a committed re-import goes through
    /// here; no display outcome ever unbinds the layer.
    pub fn reset(&mut self) {
        self.state = LayerState::Unbound;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::gateway::tests::RecordingGateway;

    fn point(lat: f64, lng: f64) -> HeatmapPoint {
        HeatmapPoint {
            lat,
            lng,
            count: 1,
        }
    }

    #[test]
    fn test_display_without_session_fails_before_backend() {
        let gateway = RecordingGateway::default();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        let result = layer.display(&gateway, None, Some(YearSelection::All));

        assert!(matches!(result, Err(TrailheatError::NoSession)));
        assert_eq!(gateway.recorded_calls().len(), 0);
        assert_eq!(*layer.state(), LayerState::Unbound);
    }

    #[test]
    fn test_display_without_selection_fails_before_backend() {
        let gateway = RecordingGateway::default();
        let session = SessionId::new();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        let result = layer.display(&gateway, Some(&session), None);

        assert!(matches!(result, Err(TrailheatError::NoYearSelected)));
        assert_eq!(gateway.recorded_calls().len(), 0);
    }

    #[test]
    fn test_display_binds_dataset_with_fixed_bounds() {
        let gateway =
            RecordingGateway::default().with_year_points(2021, vec![point(45.5, -73.5)]);
        let session = SessionId::new();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        layer
            .display(&gateway, Some(&session), Some(YearSelection::Year(2021)))
            .expect("display should bind");

        let dataset = layer.bound_dataset().expect("dataset bound");
        assert_eq!(dataset.points.len(), 1);
        assert_eq!(dataset.max, DISPLAY_MAX);
        assert_eq!(dataset.min, DISPLAY_MIN);
    }

    #[test]
    fn test_empty_payload_keeps_previous_dataset() {
        let gateway =
            RecordingGateway::default().with_year_points(2021, vec![point(45.5, -73.5)]);
        let session = SessionId::new();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        layer
            .display(&gateway, Some(&session), Some(YearSelection::Year(2021)))
            .expect("first display should bind");
        let bound_before = layer.bound_dataset().cloned();

        // 2023 has no points registered in the mock
        let result = layer.display(&gateway, Some(&session), Some(YearSelection::Year(2023)));

        assert!(matches!(result, Err(TrailheatError::NoActivitiesFound)));
        assert_eq!(layer.bound_dataset().cloned(), bound_before);
    }

    #[test]
    fn test_all_years_dispatches_aggregate_query() {
        let gateway = RecordingGateway::default()
            .with_year_points(2021, vec![point(45.5, -73.5)])
            .with_year_points(2022, vec![point(45.6, -73.4)]);
        let session = SessionId::new();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        layer
            .display(&gateway, Some(&session), Some(YearSelection::All))
            .expect("display should bind");

        let dataset = layer.bound_dataset().expect("dataset bound");
        assert_eq!(dataset.points.len(), 2);
        assert_eq!(gateway.recorded_calls(), vec!["query_all_years".to_string()]);
    }

    #[test]
    fn test_reset_unbinds() {
        let gateway =
            RecordingGateway::default().with_year_points(2021, vec![point(45.5, -73.5)]);
        let session = SessionId::new();
        let mut layer = HeatmapLayerManager::initialize(MapView::default());

        layer
            .display(&gateway, Some(&session), Some(YearSelection::Year(2021)))
            .expect("display should bind");
        layer.reset();

        assert_eq!(*layer.state(), LayerState::Unbound);
    }
}
