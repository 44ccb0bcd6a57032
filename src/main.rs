use std::path::PathBuf;

use clap::Parser;
use egui::Vec2;

use trailheat::ui::HeatmapApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory of activity files to import at startup
    #[arg(short, long)]
    import: Option<PathBuf>,
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let args = Args::parse();

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_title("Trailheat")
        .with_inner_size(Vec2::new(1100., 750.));

    eframe::run_native(
        "Trailheat",
        native_options,
        Box::new(|cc| Ok(Box::new(HeatmapApp::new(cc, args.import)))),
    )
    .expect("could not start app");
}
