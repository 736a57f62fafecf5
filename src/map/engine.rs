// src/map/engine.rs
//! The rendering-engine surface the map view drives

use super::style::LayerSpec;
use crate::error::Result;
use crate::geo::{ring_contains, LngLat};

/// Numeric feature identifier within a source layer
pub type FeatureId = u64;

/// Engine-managed annotations attached to a feature
pub type FeatureState = serde_json::Map<String, serde_json::Value>;

pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Address of a feature in the feature-state store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    pub source: String,
    pub source_layer: String,
    pub id: FeatureId,
}

impl FeatureKey {
    pub fn new(source: &str, source_layer: &str, id: FeatureId) -> Self {
        Self {
            source: source.to_string(),
            source_layer: source_layer.to_string(),
            id,
        }
    }
}

/// Position in viewport pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: ScreenPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

/// Fly-to target; unset fields keep their current value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraOptions {
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
}

impl Camera {
    /// Apply a fly-to target on top of this camera
    pub fn with_options(&self, options: &CameraOptions) -> Camera {
        Camera {
            center: options.center.unwrap_or(self.center),
            zoom: options.zoom.unwrap_or(self.zoom),
            bearing: options.bearing.unwrap_or(self.bearing),
            pitch: options.pitch.unwrap_or(self.pitch),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LngLat),
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl Geometry {
    /// First vertex of the first (outer) ring; the point's own position for points
    pub fn anchor_vertex(&self) -> Option<LngLat> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::Polygon(rings) => rings.first()?.first().copied(),
            Geometry::MultiPolygon(polygons) => polygons.first()?.first()?.first().copied(),
        }
    }

    /// Outer rings to draw or hit-test
    pub fn outer_rings(&self) -> Vec<&[LngLat]> {
        match self {
            Geometry::Point(_) => Vec::new(),
            Geometry::Polygon(rings) => rings.first().map(|r| r.as_slice()).into_iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .filter_map(|rings| rings.first().map(|r| r.as_slice()))
                .collect(),
        }
    }

    /// Point-in-polygon, honouring holes
    pub fn contains(&self, p: LngLat) -> bool {
        let polygon_contains = |rings: &[Vec<LngLat>]| match rings.split_first() {
            Some((outer, holes)) => ring_contains(outer, p) && !holes.iter().any(|h| ring_contains(h, p)),
            None => false,
        };

        match self {
            Geometry::Point(_) => false,
            Geometry::Polygon(rings) => polygon_contains(rings),
            Geometry::MultiPolygon(polygons) => polygons.iter().any(|rings| polygon_contains(rings)),
        }
    }
}

/// A feature as returned by a rendered-feature query
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    /// `None` when the source feature carries no usable numeric id
    pub id: Option<FeatureId>,
    pub layer: String,
    pub source: String,
    pub source_layer: String,
    pub geometry: Geometry,
    pub properties: Properties,
    pub state: FeatureState,
}

impl RenderedFeature {
    /// Feature-state key, if the feature can carry state at all
    pub fn key(&self) -> Option<FeatureKey> {
        self.id.map(|id| FeatureKey::new(&self.source, &self.source_layer, id))
    }
}

/// Handle to a marker overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// What the map view needs from a rendering engine.
///
/// Implementations are single-threaded; every call happens on the UI thread.
pub trait MapEngine {
    /// Settled camera (the target of the last fly-to)
    fn camera(&self) -> Camera;

    /// Move the camera, animating where the engine supports it
    fn fly_to(&mut self, options: CameraOptions);

    fn zoom_in(&mut self);

    fn zoom_out(&mut self);

    /// Screen position of a coordinate under the settled camera
    fn project(&self, at: LngLat) -> ScreenPoint;

    /// Features of the named layers rendered under `point`
    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature>;

    fn feature_state(&self, key: &FeatureKey) -> Option<&FeatureState>;

    /// Merge `state` into the feature's existing state
    fn set_feature_state(&mut self, key: &FeatureKey, state: FeatureState);

    fn remove_feature_state(&mut self, key: &FeatureKey);

    fn has_layer(&self, id: &str) -> bool;

    /// Register a layer; fails if the id is taken
    fn add_layer(&mut self, layer: LayerSpec) -> Result<()>;

    fn add_marker(&mut self, at: LngLat) -> MarkerId;

    fn remove_marker(&mut self, marker: MarkerId);

    /// All markers currently on the map
    fn markers(&self) -> Vec<(MarkerId, LngLat)>;
}
