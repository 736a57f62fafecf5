// src/display/gui/controls.rs
//! Zoom, rotate and tilt buttons

use crate::map::MapEngine;
use crate::view::{MapView, BEARING_STEP, PITCH_STEP};
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    TiltUp,
    TiltDown,
}

impl ControlAction {
    const ALL: [ControlAction; 6] = [
        ControlAction::ZoomIn,
        ControlAction::ZoomOut,
        ControlAction::RotateLeft,
        ControlAction::RotateRight,
        ControlAction::TiltUp,
        ControlAction::TiltDown,
    ];

    fn label(&self) -> &'static str {
        match self {
            ControlAction::ZoomIn => "➕",
            ControlAction::ZoomOut => "➖",
            ControlAction::RotateLeft => "←",
            ControlAction::RotateRight => "→",
            ControlAction::TiltUp => "↑",
            ControlAction::TiltDown => "↓",
        }
    }

    fn tooltip(&self) -> &'static str {
        match self {
            ControlAction::ZoomIn => "Zoom in",
            ControlAction::ZoomOut => "Zoom out",
            ControlAction::RotateLeft => "Rotate left",
            ControlAction::RotateRight => "Rotate right",
            ControlAction::TiltUp => "Tilt up",
            ControlAction::TiltDown => "Tilt down",
        }
    }

    pub fn apply<E: MapEngine>(&self, view: &mut MapView<E>) {
        match self {
            ControlAction::ZoomIn => view.zoom_in(),
            ControlAction::ZoomOut => view.zoom_out(),
            ControlAction::RotateLeft => view.pan(-BEARING_STEP, 0.0),
            ControlAction::RotateRight => view.pan(BEARING_STEP, 0.0),
            ControlAction::TiltUp => view.pan(0.0, PITCH_STEP),
            ControlAction::TiltDown => view.pan(0.0, -PITCH_STEP),
        }
    }
}

/// Vertical button column; returns the button pressed this frame
pub fn render_controls(ui: &mut egui::Ui) -> Option<ControlAction> {
    let mut pressed = None;
    ui.vertical(|ui| {
        for action in ControlAction::ALL {
            let button = egui::Button::new(egui::RichText::new(action.label()).size(18.0))
                .min_size(egui::vec2(40.0, 40.0));
            if ui.add(button).on_hover_text(action.tooltip()).clicked() {
                pressed = Some(action);
            }
        }
    });
    pressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Camera, SceneEngine};
    use crate::view::CameraState;
    use crate::LngLat;
    use std::time::Duration;

    fn view() -> MapView<SceneEngine> {
        let camera = Camera {
            center: LngLat::new(-118.031, 33.977),
            zoom: 18.0,
            bearing: -20.0,
            pitch: 60.0,
        };
        let mut engine = SceneEngine::new(camera, 800.0, 600.0);
        engine.set_flight_duration(Duration::ZERO);
        MapView::new(engine, CameraState::default())
    }

    #[test]
    fn test_actions_map_to_view_operations() {
        let mut view = view();

        ControlAction::RotateLeft.apply(&mut view);
        assert_eq!(view.camera_state().bearing, -30.0);
        ControlAction::RotateRight.apply(&mut view);
        ControlAction::RotateRight.apply(&mut view);
        assert_eq!(view.engine().camera().bearing, -10.0);

        ControlAction::TiltUp.apply(&mut view);
        assert_eq!(view.camera_state().pitch, 65.0);
        ControlAction::TiltDown.apply(&mut view);
        ControlAction::TiltDown.apply(&mut view);
        assert_eq!(view.engine().camera().pitch, 55.0);

        ControlAction::ZoomOut.apply(&mut view);
        assert_eq!(view.engine().camera().zoom, 17.0);
        ControlAction::ZoomIn.apply(&mut view);
        assert_eq!(view.engine().camera().zoom, 18.0);
    }

    #[test]
    fn test_tilt_never_passes_limits() {
        let mut view = view();
        for _ in 0..20 {
            ControlAction::TiltUp.apply(&mut view);
        }
        assert_eq!(view.engine().camera().pitch, 85.0);
        for _ in 0..40 {
            ControlAction::TiltDown.apply(&mut view);
        }
        assert_eq!(view.engine().camera().pitch, 0.0);
    }
}
