// src/display/terminal.rs
//! Headless one-shot search report

use crate::{
    error::Result,
    map::{MapEngine, SceneEngine},
    view::{MapView, SearchOutcome},
};
use std::io::Write;

pub struct TerminalDisplay;

impl TerminalDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Write a report of a finished search
    pub fn render(&self, out: &mut impl Write, view: &MapView<SceneEngine>, outcome: &SearchOutcome) -> Result<()> {
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "Building Finder - search \"{}\"", view.query())?;
        writeln!(out, "{}", "=".repeat(60))?;

        match outcome {
            SearchOutcome::Applied { result, highlighted } => {
                writeln!(out, "Result:      {:>12.6}, {:>12.6}", result.lat(), result.lng())?;
                if let Some(name) = &result.name {
                    writeln!(out, "Place:       {}", name)?;
                }
                writeln!(out, "Resolved:    {}", result.resolved_at.format("%H:%M:%S UTC"))?;
                match highlighted {
                    Some(id) => writeln!(out, "Building:    #{} highlighted", id)?,
                    None => writeln!(out, "Building:    none at this location")?,
                }
            }
            SearchOutcome::NoResult => writeln!(out, "No match for this address.")?,
            SearchOutcome::Failed(reason) => writeln!(out, "Search failed: {}", reason)?,
            SearchOutcome::Stale => writeln!(out, "Search superseded.")?,
        }

        let camera = view.engine().camera();
        writeln!(out)?;
        writeln!(
            out,
            "Camera:      center {:.6}, {:.6}  zoom {:.1}  bearing {:.0}°  pitch {:.0}°",
            camera.center.lat, camera.center.lng, camera.zoom, camera.bearing, camera.pitch
        )?;
        let marker = view
            .marker()
            .and_then(|id| view.engine().markers().into_iter().find(|(m, _)| *m == id));
        match marker {
            Some((_, at)) => writeln!(out, "Marker:      {:.6}, {:.6}", at.lat, at.lng)?,
            None => writeln!(out, "Marker:      none")?,
        }
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::display::build_view;
    use crate::geo::LngLat;
    use crate::geocode::GeocodeMatch;

    #[test]
    fn test_render_applied() {
        let mut view = build_view(&MapConfig::default(), 800.0, 600.0).unwrap();
        view.set_query("1600 Pennsylvania Ave");
        let ticket = view.begin_search().unwrap();
        let outcome = view.complete_search(
            ticket.seq,
            Ok(vec![GeocodeMatch {
                location: LngLat::new(-77.0365, 38.8977),
                name: Some("1600 Pennsylvania Avenue Northwest".to_string()),
            }]),
        );

        let mut out = Vec::new();
        TerminalDisplay::new().render(&mut out, &view, &outcome).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("search \"1600 Pennsylvania Ave\""));
        assert!(text.contains("38.897700"));
        assert!(text.contains("Place:       1600 Pennsylvania Avenue Northwest"));
        assert!(text.contains("none at this location"));
        assert!(text.contains("Marker:      38.897700, -77.036500"));
    }

    #[test]
    fn test_render_no_result() {
        let mut view = build_view(&MapConfig::default(), 800.0, 600.0).unwrap();
        view.set_query("zzzzzz");

        let mut out = Vec::new();
        TerminalDisplay::new().render(&mut out, &view, &SearchOutcome::NoResult).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No match"));
        assert!(text.contains("Marker:      none"));
    }
}
