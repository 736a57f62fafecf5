// src/view/mod.rs
//! The map view: query text, camera controls, search and building highlight

mod camera;
mod highlight;
mod search;

pub use camera::{CameraState, BEARING_STEP, MAX_PITCH, MIN_PITCH, PITCH_STEP};
pub use highlight::{nearest_feature_by, HighlightManager, HighlightOutcome};
pub use search::{GeoResult, SearchOutcome, SearchSequence, SearchTicket};

use crate::error::Result;
use crate::geocode::{GeocodeMatch, Geocoder};
use crate::map::{style, CameraOptions, FeatureId, MapEngine, MarkerId};
use chrono::Utc;

/// Zoom level the camera flies to for a search result
pub const RESULT_ZOOM: f64 = 18.0;

/// Alert text shown when a search cannot reach or understand the geocoder
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch location";

/// Owns the map engine and all per-view UI state
pub struct MapView<E: MapEngine> {
    engine: E,
    query: String,
    camera: CameraState,
    result: Option<GeoResult>,
    highlight: HighlightManager,
    marker: Option<MarkerId>,
    sequence: SearchSequence,
    notification: Option<String>,
}

impl<E: MapEngine> MapView<E> {
    pub fn new(engine: E, camera: CameraState) -> Self {
        Self {
            engine,
            query: String::new(),
            camera,
            result: None,
            highlight: HighlightManager::default(),
            marker: None,
            sequence: SearchSequence::default(),
            notification: None,
        }
    }

    /// Register the building and house-number layers; safe to call again
    pub fn initialize(&mut self) -> Result<usize> {
        style::init_layers(&mut self.engine)
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Issue a ticket for the current query; `None` when the query is blank
    pub fn begin_search(&mut self) -> Option<SearchTicket> {
        if self.query.trim().is_empty() {
            return None;
        }
        let ticket = self.sequence.issue(&self.query);
        tracing::debug!(seq = ticket.seq, query = %ticket.query, "search issued");
        Some(ticket)
    }

    /// Apply a geocoder response for ticket `seq`.
    ///
    /// Responses for anything but the latest ticket are dropped.
    pub fn complete_search(&mut self, seq: u64, response: Result<Vec<GeocodeMatch>>) -> SearchOutcome {
        if !self.sequence.is_current(seq) {
            tracing::debug!(seq, latest = self.sequence.latest(), "discarding stale search response");
            return SearchOutcome::Stale;
        }

        match response {
            Err(e) => {
                tracing::error!(error = %e, "error fetching location");
                let message = if e.is_fetch_failure() {
                    FETCH_FAILED_MESSAGE.to_string()
                } else {
                    format!("Search failed: {}", e)
                };
                self.notification = Some(message);
                SearchOutcome::Failed(e.to_string())
            }
            Ok(matches) => match matches.into_iter().next() {
                None => {
                    tracing::debug!(seq, "geocoder returned no features");
                    SearchOutcome::NoResult
                }
                Some(first) => self.apply_match(first),
            },
        }
    }

    /// Geocode the current query and apply the result
    pub async fn search<G: Geocoder>(&mut self, geocoder: &G) -> SearchOutcome {
        let Some(ticket) = self.begin_search() else {
            return SearchOutcome::NoResult;
        };
        let response = geocoder.forward(&ticket.query).await;
        self.complete_search(ticket.seq, response)
    }

    fn apply_match(&mut self, found: GeocodeMatch) -> SearchOutcome {
        let location = found.location;
        let result = GeoResult {
            location,
            name: found.name,
            resolved_at: Utc::now(),
        };

        if let Some(old) = self.marker.take() {
            self.engine.remove_marker(old);
        }
        self.marker = Some(self.engine.add_marker(location));

        self.engine.fly_to(CameraOptions {
            center: Some(location),
            zoom: Some(RESULT_ZOOM),
            bearing: Some(self.camera.bearing),
            pitch: Some(self.camera.pitch),
        });

        let highlighted = match self.highlight.highlight_at(&mut self.engine, location) {
            HighlightOutcome::Highlighted(id) => Some(id),
            HighlightOutcome::NoBuildings | HighlightOutcome::MissingId => None,
        };

        tracing::info!(lng = location.lng, lat = location.lat, ?highlighted, "moved to search result");
        self.result = Some(result.clone());
        SearchOutcome::Applied { result, highlighted }
    }

    /// Rotate and tilt; pitch stays within `MIN_PITCH..=MAX_PITCH`
    pub fn pan(&mut self, delta_bearing: f64, delta_pitch: f64) {
        self.camera.pan(delta_bearing, delta_pitch);
        self.engine.fly_to(CameraOptions {
            bearing: Some(self.camera.bearing),
            pitch: Some(self.camera.pitch),
            ..Default::default()
        });
    }

    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
    }

    /// Pending alert text, if a search failed
    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    /// Take the pending alert; it is shown once
    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    pub fn result(&self) -> Option<&GeoResult> {
        self.result.as_ref()
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlight.current().map(|key| key.id)
    }

    pub fn highlight_mut(&mut self) -> &mut HighlightManager {
        &mut self.highlight
    }

    pub fn marker(&self) -> Option<MarkerId> {
        self.marker
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
