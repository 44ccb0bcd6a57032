// Application shell: wires the buttons, year dropdown, and map panel to the
// session controller, and keeps slow imports off the UI thread.

mod basemap;
pub(crate) mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use egui::{Align, Button, CentralPanel, ComboBox, Layout, Spinner, TopBottomPanel, Ui};
use log::{error, info};

use crate::errors::TrailheatError;
use crate::heatmap::HeatmapLayerManager;
use crate::session::SessionController;
use crate::session::gateway::{BackendGateway, SessionId};
use crate::session::years::YearSelection;
use crate::store::ActivityStore;
use config::AppConfig;

const APP_TITLE: &str = "Trailheat";
const IMPORT_POLL_INTERVAL_MS: u64 = 100;
const ARCHIVE_EXTENSION: &str = "jsonl";

enum ImportKind {
    Directory,
    Archive,
}

/// `HeatmapApp` is the desktop application that imports activity tracks and
/// renders their density on a map.
pub struct HeatmapApp {
    controller: SessionController<Arc<ActivityStore>>,
    layer: HeatmapLayerManager,
    basemap: basemap::BasemapState,
    app_config: AppConfig,
    pending_import: Option<Receiver<Result<SessionId, TrailheatError>>>,
}

impl HeatmapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, import_on_launch: Option<PathBuf>) -> Self {
        let app_config = AppConfig::from_local_file().unwrap_or_default();
        let layer = HeatmapLayerManager::initialize(app_config.map_view.clone().into());
        let basemap = basemap::BasemapState::new(&cc.egui_ctx, &layer);

        let mut app = Self {
            controller: SessionController::new(Arc::new(ActivityStore::new())),
            layer,
            basemap,
            app_config,
            pending_import: None,
        };
        if let Some(directory) = import_on_launch {
            app.start_import(ImportKind::Directory, directory);
        }
        app
    }

    /// Claims the single import slot and hands the parse to a worker thread
    /// so the map keeps rendering. The outcome is polled every frame.
    fn start_import(&mut self, kind: ImportKind, path: PathBuf) {
        if let Err(e) = self.controller.begin_import() {
            show_message(&e);
            return;
        }

        let gateway = self.controller.gateway().clone();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = match kind {
                ImportKind::Directory => gateway.import_directory(&path),
                ImportKind::Archive => gateway.import_archive(&path),
            };
            let _ = outcome_tx.send(outcome);
        });
        self.pending_import = Some(outcome_rx);
    }

    fn poll_import(&mut self) {
        let Some(outcome_rx) = &self.pending_import else {
            return;
        };

        let outcome = match outcome_rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(TrailheatError::ImportWorkerError),
        };

        self.pending_import = None;
        match self.controller.finish_import(outcome, &mut self.layer) {
            Ok(()) => info!(
                "session ready with {} years",
                self.controller.years().available().len()
            ),
            Err(e) => {
                error!("import failed: {e}");
                show_message(&e);
            }
        }
    }

    fn show_controls(&mut self, ui: &mut Ui) {
        let busy = self.controller.is_busy();
        let has_session = self.controller.session().is_some();

        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            if ui
                .add_enabled(!busy, Button::new("Load activities…"))
                .clicked()
                && let Some(directory) = rfd::FileDialog::new().pick_folder()
            {
                self.start_import(ImportKind::Directory, directory);
            }

            if ui.add_enabled(!busy, Button::new("Load archive…")).clicked()
                && let Some(file) = rfd::FileDialog::new()
                    .add_filter("session archive", &[ARCHIVE_EXTENSION])
                    .pick_file()
            {
                self.start_import(ImportKind::Archive, file);
            }

            if ui
                .add_enabled(!busy && has_session, Button::new("Export…"))
                .clicked()
                && let Some(file) = rfd::FileDialog::new()
                    .set_file_name(format!("session.{ARCHIVE_EXTENSION}"))
                    .save_file()
            {
                match self.controller.export_session(&file) {
                    Ok(()) => info!("session exported to {}", file.display()),
                    Err(e) => show_message(&e),
                }
            }

            ui.separator();
            ui.label("Year:");
            self.show_year_selector(ui);

            if ui.add_enabled(!busy, Button::new("Display")).clicked()
                && let Err(e) = self.controller.request_display(&mut self.layer)
            {
                show_message(&e);
            }

            if self.controller.indicator().is_visible() {
                ui.add(Spinner::new());
            }
        });
    }

    fn show_year_selector(&mut self, ui: &mut Ui) {
        let mut selection = self.controller.years().selection();
        let previous = selection;

        ComboBox::from_id_salt("year_selection")
            .selected_text(selection.label())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selection, YearSelection::All, "All");
                for year in self.controller.years().available().to_vec() {
                    ui.selectable_value(&mut selection, YearSelection::Year(year), year.to_string());
                }
            });

        if selection != previous
            && let Err(e) = self.controller.select_year(selection)
        {
            show_message(&e);
        }
    }
}

impl eframe::App for HeatmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_import();
        if self.controller.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(IMPORT_POLL_INTERVAL_MS));
        }

        TopBottomPanel::top("controls").show(ctx, |ui| self.show_controls(ui));
        CentralPanel::default().show(ctx, |ui| {
            basemap::show_basemap(ui, &mut self.basemap, &self.layer);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.app_config.map_view = self.basemap.current_view().into();
        if let Err(e) = self.app_config.save() {
            error!("could not save config: {e}");
        }
    }
}

/// Surfaces an operation's terminal error as a modal dialog. Validation
/// failures and empty results are notices, everything else is an error.
fn show_message(error: &TrailheatError) {
    let level = match error {
        TrailheatError::NoActivitiesFound => rfd::MessageLevel::Info,
        e if e.is_validation() => rfd::MessageLevel::Warning,
        _ => rfd::MessageLevel::Error,
    };
    rfd::MessageDialog::new()
        .set_title(APP_TITLE)
        .set_description(error.to_string())
        .set_level(level)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
