// src/geocode/mod.rs
//! Forward geocoding and address autofill

mod autofill;
mod mapbox;

pub use autofill::{AddressAutofill, RetrieveResponse, Suggestion};
pub use mapbox::MapboxGeocoder;

use crate::error::{MapError, Result};
use crate::geo::LngLat;
use serde::Deserialize;
use std::future::Future;

/// One validated geocoder match
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub location: LngLat,
    /// Formatted place name, when the service returned one
    pub name: Option<String>,
}

/// Turns free text into candidate locations, best match first.
///
/// An empty list means "no result" and is not an error.
pub trait Geocoder {
    fn forward(&self, query: &str) -> impl Future<Output = Result<Vec<GeocodeMatch>>> + Send;
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    features: Option<Vec<RawFeature>>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Parse a forward-geocoding response body.
///
/// A body that is not a JSON object is a JSON error. A missing or empty
/// `features` array is an empty result. The first feature must carry a
/// finite `[lng, lat]` point geometry or the reply is a parse error; later
/// features without one are skipped.
pub fn parse_geocode_response(body: &str) -> Result<Vec<GeocodeMatch>> {
    let raw: RawResponse = serde_json::from_str(body)?;

    let features = raw.features.unwrap_or_default();
    let mut matches = Vec::with_capacity(features.len());

    for (index, feature) in features.into_iter().enumerate() {
        let location = feature
            .geometry
            .as_ref()
            .and_then(|g| g.coordinates.as_array())
            .map(|coords| coords.iter().filter_map(|c| c.as_f64()).collect::<Vec<_>>())
            .and_then(|coords| LngLat::from_position(&coords));

        let Some(location) = location else {
            if index == 0 {
                return Err(MapError::Parse("first feature has no usable point coordinates".to_string()));
            }
            tracing::debug!(index, "skipping geocoder feature without point coordinates");
            continue;
        };

        let name = ["full_address", "name"]
            .iter()
            .find_map(|key| feature.properties.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string);

        matches.push(GeocodeMatch { location, name });
    }

    Ok(matches)
}
