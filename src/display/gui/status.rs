// src/display/gui/status.rs
//! Status bar: camera readout and last search result

use crate::{
    map::{MapEngine, SceneEngine},
    view::MapView,
};
use eframe::egui;

fn format_result_time(view: &MapView<SceneEngine>) -> String {
    match view.result() {
        Some(result) => result.resolved_at.format("%H:%M:%S UTC").to_string(),
        None => "No search yet".to_string(),
    }
}

fn format_highlight(view: &MapView<SceneEngine>) -> String {
    match view.highlighted() {
        Some(id) => format!("#{}", id),
        None => "None".to_string(),
    }
}

pub fn render_status_bar(ui: &mut egui::Ui, view: &MapView<SceneEngine>, searching: bool) {
    let camera = view.engine().camera();

    ui.horizontal(|ui| {
        let status_color = if searching {
            egui::Color32::YELLOW
        } else if view.result().is_some() {
            egui::Color32::GREEN
        } else {
            egui::Color32::GRAY
        };
        ui.colored_label(status_color, "●");

        ui.monospace(format!("{:.6}, {:.6}", camera.center.lat, camera.center.lng));
        ui.separator();
        ui.label(format!("Zoom {:.1}", camera.zoom));
        ui.separator();
        ui.label(format!("Bearing {:.0}°", camera.bearing));
        ui.separator();
        ui.label(format!("Pitch {:.0}°", camera.pitch));
        ui.separator();
        ui.label(format!("Result: {}", format_result_time(view)));
        ui.separator();
        ui.label(format!("Building: {}", format_highlight(view)));

        if let Some(name) = view.result().and_then(|r| r.name.as_deref()) {
            ui.separator();
            ui.weak(name);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::display::build_view;
    use crate::geocode::GeocodeMatch;
    use crate::LngLat;

    #[test]
    fn test_formats_before_and_after_search() {
        let mut view = build_view(&MapConfig::default(), 800.0, 600.0).unwrap();
        assert_eq!(format_result_time(&view), "No search yet");
        assert_eq!(format_highlight(&view), "None");

        view.set_query("somewhere");
        let ticket = view.begin_search().unwrap();
        view.complete_search(
            ticket.seq,
            Ok(vec![GeocodeMatch {
                location: LngLat::new(-118.0, 34.0),
                name: None,
            }]),
        );
        assert!(format_result_time(&view).ends_with("UTC"));
    }
}
