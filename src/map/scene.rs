// src/map/scene.rs
//! In-memory map engine: camera, projection, layers, feature state and markers

use super::engine::{
    Camera, CameraOptions, FeatureKey, FeatureState, MapEngine, MarkerId, RenderedFeature, ScreenPoint,
};
use super::source::{SourceFeature, VectorSource};
use super::style::LayerSpec;
use crate::error::{MapError, Result};
use crate::geo::{from_world_px, to_world_px, LngLat};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Hit-test slack around a footprint edge, in pixels
const QUERY_TOLERANCE_PX: f64 = 3.0;

const DEFAULT_FLIGHT: Duration = Duration::from_millis(1200);

/// Maps between coordinates and viewport pixels for one camera
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    camera: Camera,
    width: f64,
    height: f64,
}

impl Projector {
    pub fn new(camera: Camera, width: f64, height: f64) -> Self {
        Self { camera, width, height }
    }

    pub fn project(&self, at: LngLat) -> ScreenPoint {
        let (wx, wy) = to_world_px(at, self.camera.zoom);
        let (cx, cy) = to_world_px(self.camera.center, self.camera.zoom);
        let (dx, dy) = (wx - cx, wy - cy);

        // Positive bearing turns the map counter-clockwise on screen
        let (sin, cos) = (-self.camera.bearing).to_radians().sin_cos();
        ScreenPoint::new(
            self.width / 2.0 + dx * cos - dy * sin,
            self.height / 2.0 + dx * sin + dy * cos,
        )
    }

    pub fn unproject(&self, point: ScreenPoint) -> LngLat {
        let (sx, sy) = (point.x - self.width / 2.0, point.y - self.height / 2.0);
        let (sin, cos) = self.camera.bearing.to_radians().sin_cos();
        let (dx, dy) = (sx * cos - sy * sin, sx * sin + sy * cos);

        let (cx, cy) = to_world_px(self.camera.center, self.camera.zoom);
        from_world_px(cx + dx, cy + dy, self.camera.zoom)
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }
}

/// Eased interpolation between two cameras, used only for drawing
#[derive(Debug, Clone)]
pub struct CameraTransition {
    from: Camera,
    to: Camera,
    duration: Duration,
    elapsed: Duration,
}

impl CameraTransition {
    pub fn new(from: Camera, to: Camera, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn current(&self) -> Camera {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        // Cubic ease-in-out
        let t = if t < 0.5 { 4.0 * t * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0 };
        let lerp = |a: f64, b: f64| a + (b - a) * t;

        // Turn the short way round
        let mut bearing_delta = (self.to.bearing - self.from.bearing) % 360.0;
        if bearing_delta > 180.0 {
            bearing_delta -= 360.0;
        } else if bearing_delta < -180.0 {
            bearing_delta += 360.0;
        }

        Camera {
            center: LngLat::new(
                lerp(self.from.center.lng, self.to.center.lng),
                lerp(self.from.center.lat, self.to.center.lat),
            ),
            zoom: lerp(self.from.zoom, self.to.zoom),
            bearing: self.from.bearing + bearing_delta * t,
            pitch: lerp(self.from.pitch, self.to.pitch),
        }
    }
}

pub struct SceneEngine {
    camera: Camera,
    transition: Option<CameraTransition>,
    flight_duration: Duration,
    viewport: (f64, f64),
    sources: HashMap<String, VectorSource>,
    layers: Vec<LayerSpec>,
    feature_states: HashMap<FeatureKey, FeatureState>,
    markers: BTreeMap<MarkerId, LngLat>,
    next_marker: u64,
}

impl SceneEngine {
    pub fn new(camera: Camera, width: f64, height: f64) -> Self {
        Self {
            camera,
            transition: None,
            flight_duration: DEFAULT_FLIGHT,
            viewport: (width, height),
            sources: HashMap::new(),
            layers: Vec::new(),
            feature_states: HashMap::new(),
            markers: BTreeMap::new(),
            next_marker: 0,
        }
    }

    /// Zero disables fly-to animation
    pub fn set_flight_duration(&mut self, duration: Duration) {
        self.flight_duration = duration;
    }

    pub fn add_source(&mut self, id: &str, source: VectorSource) {
        self.sources.insert(id.to_string(), source);
    }

    pub fn source(&self, id: &str) -> Option<&VectorSource> {
        self.sources.get(id)
    }

    pub fn source_mut(&mut self, id: &str) -> &mut VectorSource {
        self.sources.entry(id.to_string()).or_default()
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Resize the viewport; the settled camera stays centred
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    /// Camera to draw with: mid-flight while a transition runs
    pub fn display_camera(&self) -> Camera {
        self.transition.as_ref().map_or(self.camera, CameraTransition::current)
    }

    /// Step the fly-to animation; returns whether it is still running
    pub fn advance(&mut self, dt: Duration) -> bool {
        if let Some(transition) = &mut self.transition {
            transition.advance(dt);
            if transition.is_finished() {
                self.transition = None;
            }
        }
        self.transition.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.camera, self.viewport.0, self.viewport.1)
    }

    pub fn display_projector(&self) -> Projector {
        Projector::new(self.display_camera(), self.viewport.0, self.viewport.1)
    }

    /// Drag the settled camera by a screen delta, without animation
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let projector = self.projector();
        let (w, h) = self.viewport;
        let center = projector.unproject(ScreenPoint::new(w / 2.0 - dx, h / 2.0 - dy));
        self.camera.center = center;
        self.transition = None;
    }

    fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn set_camera(&mut self, target: Camera) {
        let target = Camera {
            zoom: target.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            ..target
        };
        let from = self.display_camera();
        self.transition = if self.flight_duration.is_zero() {
            None
        } else {
            Some(CameraTransition::new(from, target, self.flight_duration))
        };
        self.camera = target;
    }

    /// Whether a polygon footprint lies under or within tolerance of a point
    fn hits(&self, projector: &Projector, feature: &SourceFeature, point: ScreenPoint) -> bool {
        if feature.geometry.contains(projector.unproject(point)) {
            return true;
        }
        feature.geometry.outer_rings().iter().any(|ring| {
            let screen: Vec<ScreenPoint> = ring.iter().map(|p| projector.project(*p)).collect();
            screen
                .windows(2)
                .any(|edge| segment_distance(point, edge[0], edge[1]) <= QUERY_TOLERANCE_PX)
        })
    }
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(ScreenPoint::new(a.x + t * abx, a.y + t * aby))
}

impl MapEngine for SceneEngine {
    fn camera(&self) -> Camera {
        self.camera
    }

    fn fly_to(&mut self, options: CameraOptions) {
        let target = self.camera.with_options(&options);
        tracing::debug!(?target, "fly to");
        self.set_camera(target);
    }

    fn zoom_in(&mut self) {
        let target = Camera {
            zoom: self.camera.zoom + 1.0,
            ..self.camera
        };
        self.set_camera(target);
    }

    fn zoom_out(&mut self) {
        let target = Camera {
            zoom: self.camera.zoom - 1.0,
            ..self.camera
        };
        self.set_camera(target);
    }

    fn project(&self, at: LngLat) -> ScreenPoint {
        self.projector().project(at)
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[&str]) -> Vec<RenderedFeature> {
        let projector = self.projector();
        let mut found = Vec::new();

        for layer_id in layers {
            let Some(layer) = self.layer(layer_id) else {
                tracing::debug!(layer = %layer_id, "query on unknown layer");
                continue;
            };
            if !layer.visible_at(self.camera.zoom) {
                continue;
            }
            let Some(source) = self.sources.get(&layer.source) else {
                continue;
            };

            for feature in source.features(&layer.source_layer) {
                if !self.hits(&projector, feature, point) {
                    continue;
                }
                let state = feature
                    .id
                    .and_then(|id| {
                        self.feature_states
                            .get(&FeatureKey::new(&layer.source, &layer.source_layer, id))
                    })
                    .cloned()
                    .unwrap_or_default();

                found.push(RenderedFeature {
                    id: feature.id,
                    layer: layer.id.clone(),
                    source: layer.source.clone(),
                    source_layer: layer.source_layer.clone(),
                    geometry: feature.geometry.clone(),
                    properties: feature.properties.clone(),
                    state,
                });
            }
        }

        found
    }

    fn feature_state(&self, key: &FeatureKey) -> Option<&FeatureState> {
        self.feature_states.get(key)
    }

    fn set_feature_state(&mut self, key: &FeatureKey, state: FeatureState) {
        self.feature_states.entry(key.clone()).or_default().extend(state);
    }

    fn remove_feature_state(&mut self, key: &FeatureKey) {
        self.feature_states.remove(key);
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<()> {
        if self.has_layer(&layer.id) {
            return Err(MapError::Style(format!("layer {} already exists", layer.id)));
        }
        self.layers.push(layer);
        Ok(())
    }

    fn add_marker(&mut self, at: LngLat) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(id, at);
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }

    fn markers(&self) -> Vec<(MarkerId, LngLat)> {
        self.markers.iter().map(|(id, at)| (*id, *at)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::style::{self, BUILDINGS_LAYER, BUILDING_SOURCE_LAYER, COMPOSITE_SOURCE};
    use crate::map::Geometry;

    const CENTER: LngLat = LngLat::new(-77.0365, 38.8977);

    fn camera() -> Camera {
        Camera {
            center: CENTER,
            zoom: 18.0,
            bearing: -20.0,
            pitch: 60.0,
        }
    }

    /// Axis-aligned footprint centred on `at`, half-size in degrees
    fn footprint(id: Option<u64>, at: LngLat, half: f64) -> SourceFeature {
        let ring = vec![
            LngLat::new(at.lng - half, at.lat - half),
            LngLat::new(at.lng + half, at.lat - half),
            LngLat::new(at.lng + half, at.lat + half),
            LngLat::new(at.lng - half, at.lat + half),
            LngLat::new(at.lng - half, at.lat - half),
        ];
        SourceFeature {
            id,
            geometry: Geometry::Polygon(vec![ring]),
            properties: Default::default(),
        }
    }

    fn engine_with_buildings() -> SceneEngine {
        let mut engine = SceneEngine::new(camera(), 800.0, 600.0);
        engine.set_flight_duration(Duration::ZERO);
        engine.source_mut(COMPOSITE_SOURCE).insert_features(
            BUILDING_SOURCE_LAYER,
            vec![
                footprint(Some(1), CENTER, 0.0001),
                footprint(Some(2), LngLat::new(CENTER.lng + 0.001, CENTER.lat), 0.0001),
            ],
        );
        style::init_layers(&mut engine).unwrap();
        engine
    }

    #[test]
    fn test_projection_round_trip_with_bearing() {
        let projector = Projector::new(camera(), 800.0, 600.0);
        assert_eq!(projector.project(CENTER), ScreenPoint::new(400.0, 300.0));

        let p = LngLat::new(CENTER.lng + 0.0003, CENTER.lat - 0.0002);
        let back = projector.unproject(projector.project(p));
        assert!((back.lng - p.lng).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
    }

    #[test]
    fn test_north_up_east_is_right() {
        let north_up = Camera { bearing: 0.0, ..camera() };
        let projector = Projector::new(north_up, 800.0, 600.0);
        let east = projector.project(LngLat::new(CENTER.lng + 0.001, CENTER.lat));
        let north = projector.project(LngLat::new(CENTER.lng, CENTER.lat + 0.001));
        assert!(east.x > 400.0 && (east.y - 300.0).abs() < 1e-6);
        assert!(north.y < 300.0);
    }

    #[test]
    fn test_query_returns_features_under_point() {
        let engine = engine_with_buildings();
        let point = engine.project(CENTER);

        let found = engine.query_rendered_features(point, &[BUILDINGS_LAYER]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(1));
        assert_eq!(found[0].layer, BUILDINGS_LAYER);

        let empty = engine.project(LngLat::new(CENTER.lng - 0.01, CENTER.lat));
        assert!(engine.query_rendered_features(empty, &[BUILDINGS_LAYER]).is_empty());
    }

    #[test]
    fn test_query_respects_layer_visibility_and_existence() {
        let mut engine = engine_with_buildings();
        let point = engine.project(CENTER);

        assert!(engine.query_rendered_features(point, &["no-such-layer"]).is_empty());

        engine.fly_to(CameraOptions {
            zoom: Some(14.0),
            ..Default::default()
        });
        let point = engine.project(CENTER);
        assert!(engine.query_rendered_features(point, &[BUILDINGS_LAYER]).is_empty());
    }

    #[test]
    fn test_query_includes_edge_tolerance() {
        let engine = engine_with_buildings();
        // Just outside building 1's east edge
        let edge = engine.project(LngLat::new(CENTER.lng + 0.0001, CENTER.lat));
        let nudged = ScreenPoint::new(edge.x + 1.0, edge.y);
        let found = engine.query_rendered_features(nudged, &[BUILDINGS_LAYER]);
        assert!(found.iter().any(|f| f.id == Some(1)));
    }

    #[test]
    fn test_feature_state_merge_and_remove() {
        let mut engine = engine_with_buildings();
        let key = FeatureKey::new(COMPOSITE_SOURCE, BUILDING_SOURCE_LAYER, 1);

        let mut state = FeatureState::new();
        state.insert("highlighted".to_string(), true.into());
        engine.set_feature_state(&key, state);

        let mut other = FeatureState::new();
        other.insert("hover".to_string(), false.into());
        engine.set_feature_state(&key, other);

        let stored = engine.feature_state(&key).unwrap();
        assert_eq!(stored.get("highlighted"), Some(&true.into()));
        assert_eq!(stored.get("hover"), Some(&false.into()));

        let found = engine.query_rendered_features(engine.project(CENTER), &[BUILDINGS_LAYER]);
        assert_eq!(found[0].state.get("highlighted"), Some(&true.into()));

        engine.remove_feature_state(&key);
        assert!(engine.feature_state(&key).is_none());
    }

    #[test]
    fn test_add_layer_rejects_duplicates() {
        let mut engine = engine_with_buildings();
        assert!(engine.add_layer(style::buildings_layer()).is_err());
        assert_eq!(style::init_layers(&mut engine).unwrap(), 0);
        assert_eq!(engine.layers().len(), 2);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut engine = engine_with_buildings();
        for _ in 0..10 {
            engine.zoom_in();
        }
        assert_eq!(engine.camera().zoom, MAX_ZOOM);
        engine.fly_to(CameraOptions {
            zoom: Some(0.5),
            ..Default::default()
        });
        engine.zoom_out();
        assert_eq!(engine.camera().zoom, MIN_ZOOM);
    }

    #[test]
    fn test_markers() {
        let mut engine = engine_with_buildings();
        let a = engine.add_marker(CENTER);
        let b = engine.add_marker(LngLat::new(0.0, 0.0));
        assert_ne!(a, b);
        engine.remove_marker(a);
        assert_eq!(engine.markers(), vec![(b, LngLat::new(0.0, 0.0))]);
    }

    #[test]
    fn test_fly_to_transition() {
        let mut engine = SceneEngine::new(camera(), 800.0, 600.0);
        let target = LngLat::new(-118.031, 33.977);
        engine.fly_to(CameraOptions {
            center: Some(target),
            ..Default::default()
        });

        // Settled camera moves at once; the drawn one catches up
        assert_eq!(engine.camera().center, target);
        assert!(engine.is_animating());
        assert_eq!(engine.display_camera().center, CENTER);

        assert!(engine.advance(Duration::from_millis(600)));
        let mid = engine.display_camera().center;
        assert!(mid.lng < CENTER.lng && mid.lng > target.lng);

        assert!(!engine.advance(Duration::from_secs(1)));
        assert_eq!(engine.display_camera().center, target);
    }

    #[test]
    fn test_transition_turns_short_way() {
        let from = Camera { bearing: 170.0, ..camera() };
        let to = Camera { bearing: -170.0, ..camera() };
        let mut transition = CameraTransition::new(from, to, Duration::from_secs(1));
        transition.advance(Duration::from_millis(500));
        let bearing = transition.current().bearing;
        assert!((bearing - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan_by_moves_center() {
        let mut engine = engine_with_buildings();
        let north_up = Camera { bearing: 0.0, ..camera() };
        engine.fly_to(CameraOptions {
            bearing: Some(north_up.bearing),
            ..Default::default()
        });
        engine.pan_by(-100.0, 0.0);
        assert!(engine.camera().center.lng > CENTER.lng);
    }
}
