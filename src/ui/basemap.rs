//! Basemap rendering using walkers (slippy tiles) with the heatmap density
//! overlay drawn on top through a map plugin.

use egui::{Color32, Ui};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpTiles, Map, MapMemory, Plugin, Position, Projector, TileId, lat_lon};

use crate::heatmap::{HeatmapDataset, HeatmapLayerManager, MapView, OverlayConfig, TileLayerConfig};

const COLD_COLOR: Color32 = Color32::from_rgb(34, 94, 224);
const WARM_COLOR: Color32 = Color32::from_rgb(248, 212, 74);
const HOT_COLOR: Color32 = Color32::from_rgb(228, 54, 32);

/// Fallback disc radius in pixels when radius scaling is disabled.
const FIXED_RADIUS_PX: f32 = 4.0;

/// Tile source built from the layer manager's base layer configuration.
struct ConfiguredTiles {
    config: TileLayerConfig,
}

impl TileSource for ConfiguredTiles {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.config
            .url_template
            .replace("{z}", &tile_id.zoom.to_string())
            .replace("{x}", &tile_id.x.to_string())
            .replace("{y}", &tile_id.y.to_string())
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.config.attribution_text,
            url: self.config.attribution_url,
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        self.config.max_zoom
    }
}

/// Persistent map surface state (survives between frames).
pub(crate) struct BasemapState {
    tiles: HttpTiles,
    memory: MapMemory,
    center: Position,
}

impl BasemapState {
    pub(crate) fn new(ctx: &egui::Context, layer: &HeatmapLayerManager) -> Self {
        let view = layer.view();
        let source = ConfiguredTiles {
            config: layer.tile_layer().clone(),
        };
        let mut memory = MapMemory::default();
        if let Err(e) = memory.set_zoom(view.zoom) {
            log::debug!("could not apply saved zoom: {e:?}");
        }

        Self {
            tiles: HttpTiles::new(source, ctx.clone()),
            memory,
            center: lat_lon(view.center_lat, view.center_lng),
        }
    }

    /// The viewport the user is currently looking at, for persistence.
    pub(crate) fn current_view(&self) -> MapView {
        let center = self.memory.detached().unwrap_or(self.center);
        MapView {
            center_lat: center.y(),
            center_lng: center.x(),
            zoom: self.memory.zoom(),
        }
    }
}

/// Plugin that paints the bound dataset as intensity-colored discs.
struct DensityOverlay<'a> {
    dataset: &'a HeatmapDataset,
    config: &'a OverlayConfig,
}

impl Plugin for DensityOverlay<'_> {
    fn run(
        self: Box<Self>,
        ui: &mut Ui,
        _response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let painter = ui.painter();
        let rect = ui.max_rect();
        let radius_px = disc_radius_px(self.dataset, self.config, projector);
        let scale_max = intensity_ceiling(self.dataset, self.config);

        for point in &self.dataset.points {
            let projected = projector.project(lat_lon(point.lat, point.lng));
            let pos = egui::pos2(projected.x, projected.y);
            if !rect.expand(radius_px).contains(pos) {
                continue;
            }

            let span = (scale_max - self.dataset.min).max(1.0);
            let intensity = ((point.count as f32 - self.dataset.min) / span).clamp(0.0, 1.0);
            let alpha = ((0.3 + 0.7 * intensity) * self.config.max_opacity * 255.0) as u8;
            let color = ramp_color(intensity);

            // soft halo standing in for the blur pass of a raster heatmap
            if self.config.blur > 0.0 {
                painter.circle_filled(
                    pos,
                    radius_px * (1.0 + self.config.blur),
                    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha / 3),
                );
            }
            painter.circle_filled(
                pos,
                radius_px,
                Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha),
            );
        }
    }
}

/// Upper bound of the intensity scale. With `use_local_extrema` the ceiling
/// follows the densest point of the bound dataset; otherwise the dataset's
/// fixed display bound applies.
fn intensity_ceiling(dataset: &HeatmapDataset, config: &OverlayConfig) -> f32 {
    if config.use_local_extrema {
        dataset
            .points
            .iter()
            .map(|p| p.count)
            .max()
            .unwrap_or(1) as f32
    } else {
        dataset.max
    }
}

/// Screen radius of one density disc. With `scale_radius` the configured
/// radius is in degrees of latitude, so it grows and shrinks with the zoom
/// level; otherwise a fixed pixel size is used.
fn disc_radius_px(
    dataset: &HeatmapDataset,
    config: &OverlayConfig,
    projector: &Projector,
) -> f32 {
    if !config.scale_radius {
        return FIXED_RADIUS_PX;
    }
    let Some(sample) = dataset.points.first() else {
        return FIXED_RADIUS_PX;
    };
    let at_point = projector.project(lat_lon(sample.lat, sample.lng));
    let one_radius_north = projector.project(lat_lon(sample.lat + config.radius, sample.lng));
    (at_point.y - one_radius_north.y).abs().max(1.0)
}

/// Two-segment color ramp from cold to hot, interpolated the same way the
/// plot strokes shade between palette colors.
fn ramp_color(intensity: f32) -> Color32 {
    if intensity < 0.5 {
        shade(COLD_COLOR, WARM_COLOR, intensity * 2.0)
    } else {
        shade(WARM_COLOR, HOT_COLOR, (intensity - 0.5) * 2.0)
    }
}

fn shade(start: Color32, end: Color32, t: f32) -> Color32 {
    let channel = |a: u8, b: u8| -> u8 {
        (a as f32 + t * (b as f32 - a as f32)).clamp(0.0, 255.0) as u8
    };
    Color32::from_rgb(
        channel(start.r(), end.r()),
        channel(start.g(), end.g()),
        channel(start.b(), end.b()),
    )
}

/// Render the basemap with the currently bound heatmap dataset, if any.
pub(crate) fn show_basemap(ui: &mut Ui, state: &mut BasemapState, layer: &HeatmapLayerManager) {
    let mut map = Map::new(Some(&mut state.tiles), &mut state.memory, state.center);

    if let Some(dataset) = layer.bound_dataset() {
        map = map.with_plugin(DensityOverlay {
            dataset,
            config: layer.overlay(),
        });
    }

    ui.add(map);
}
