// src/display/gui/mod.rs v2
//! GUI display module - Main orchestration

mod app;
mod controls;
mod map_canvas;
mod search_bar;
mod status;

pub use app::BuildingFinderApp;

use crate::{config::MapConfig, error::Result};

/// Open the map window and block until it is closed
pub fn run(config: &MapConfig) -> Result<()> {
    let app = BuildingFinderApp::new(config)?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("Building Finder"),
        ..Default::default()
    };

    tracing::info!("Starting GUI");
    eframe::run_native(
        "Building Finder",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(eframe::egui::Visuals::light());
            Ok(Box::new(app))
        }),
    )?;
    Ok(())
}
