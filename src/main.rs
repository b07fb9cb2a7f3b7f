mod app;
mod ui;

use std::path::PathBuf;

use app::RustyFourierApp;
use eframe::egui;
use rusty_fourier::config::{default_config_path, load_config};

fn main() -> eframe::Result {
    env_logger::init();

    let config = default_config_path()
        .map(|path| load_config(&path))
        .unwrap_or_default();
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 600.0])
            .with_min_inner_size([800.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Fourier – Spectrum Editor",
        options,
        Box::new(move |_cc| {
            let mut app = RustyFourierApp::new(&config);
            if let Some(path) = initial {
                let opened = app.state.open_path(&path);
                app.state.report(opened);
            }
            Ok(Box::new(app))
        }),
    )
}
