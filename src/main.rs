use std::path::PathBuf;

use eframe::egui;
use gridplot::app::GridPlotApp;
use gridplot::config::{ParseConfig, CONFIG_ENV};
use gridplot::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => ParseConfig::default()
            .load_overrides(&PathBuf::from(path))
            .unwrap_or_else(|e| {
                log::error!("Ignoring configuration overrides: {e:#}");
                ParseConfig::default()
            }),
        None => ParseConfig::default(),
    };

    let mut state = AppState::new(config);
    if let Some(path) = std::env::args_os().nth(1) {
        state.open(&PathBuf::from(path));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "GridPlot – Selection Plotter",
        options,
        Box::new(|_cc| Ok(Box::new(GridPlotApp::new(state)))),
    )
}
