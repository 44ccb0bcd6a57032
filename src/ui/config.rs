use serde::{Deserialize, Serialize};

use crate::errors::TrailheatError;
use crate::heatmap::MapView;

const CONFIG_DIR_NAME: &str = "trailheat";
const CONFIG_FILE_NAME: &str = "config.json";

/// Last map viewport, persisted so the next launch opens where the user
/// left off.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct SavedView {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
    pub(crate) zoom: f64,
}

impl Default for SavedView {
    fn default() -> Self {
        MapView::default().into()
    }
}

impl From<SavedView> for MapView {
    fn from(value: SavedView) -> Self {
        MapView {
            center_lat: value.lat,
            center_lng: value.lng,
            zoom: value.zoom,
        }
    }
}

impl From<MapView> for SavedView {
    fn from(value: MapView) -> Self {
        Self {
            lat: value.center_lat,
            lng: value.center_lng,
            zoom: value.zoom,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) map_view: SavedView,
}

impl AppConfig {
    pub(crate) fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).expect("Could not open config file");
            Some(serde_json::from_reader(file).expect("Could not parse config file"))
        } else {
            None
        }
    }

    pub(crate) fn save(&self) -> Result<(), TrailheatError> {
        let config_dir = dirs::config_dir()
            .ok_or(TrailheatError::NoConfigDir)?
            .join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&config_dir)
            .map_err(|e| TrailheatError::ConfigIOError { source: e })?;

        let file = std::fs::File::create(config_dir.join(CONFIG_FILE_NAME))
            .map_err(|e| TrailheatError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TrailheatError::ConfigSerializeError { source: e })?;
        Ok(())
    }
}
