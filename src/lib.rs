// src/lib.rs
//! Building Finder Library
//!
//! Search for a street address, fly the map camera to it and highlight the
//! nearest 3D building.

pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod map;
pub mod view;

// Re-export main types for convenience
pub use config::MapConfig;
pub use error::{MapError, Result};
pub use geo::LngLat;
pub use geocode::{Geocoder, MapboxGeocoder};
pub use map::{MapEngine, SceneEngine};
pub use view::{MapView, SearchOutcome};

#[cfg(feature = "gui")]
pub use display::gui::BuildingFinderApp;
