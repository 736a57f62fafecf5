// src/view/highlight.rs
//! Nearest-building selection and single-highlight bookkeeping

use crate::geo::{planar_distance, DistanceFn, LngLat};
use crate::map::style::{BUILDINGS_LAYER, HIGHLIGHT_FLAG};
use crate::map::{FeatureId, FeatureKey, FeatureState, MapEngine, RenderedFeature};

/// Pick the feature whose anchor vertex is nearest to `target` under `distance`.
///
/// Ties keep the first feature seen. Features without an anchor vertex are
/// never preferred; if none has one, the first feature is returned.
pub fn nearest_feature_by(
    features: &[RenderedFeature],
    target: LngLat,
    distance: DistanceFn,
) -> Option<&RenderedFeature> {
    let mut best = features.first()?;
    let mut best_distance = f64::INFINITY;

    for feature in features {
        let Some(anchor) = feature.geometry.anchor_vertex() else {
            continue;
        };
        let d = distance(anchor, target);
        if d < best_distance {
            best_distance = d;
            best = feature;
        }
    }

    Some(best)
}

/// What a highlight pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOutcome {
    Highlighted(FeatureId),
    /// No building under the point; any previous highlight is gone
    NoBuildings,
    /// The nearest building had no id; any previous highlight is gone
    MissingId,
}

/// Owns the one highlighted building, if any
#[derive(Debug, Clone)]
pub struct HighlightManager {
    current: Option<FeatureKey>,
    distance: DistanceFn,
}

impl Default for HighlightManager {
    fn default() -> Self {
        Self::new(planar_distance)
    }
}

impl HighlightManager {
    pub fn new(distance: DistanceFn) -> Self {
        Self {
            current: None,
            distance,
        }
    }

    pub fn current(&self) -> Option<&FeatureKey> {
        self.current.as_ref()
    }

    pub fn set_distance_fn(&mut self, distance: DistanceFn) {
        self.distance = distance;
    }

    /// Unset the current highlight's feature state
    pub fn clear<E: MapEngine>(&mut self, engine: &mut E) {
        if let Some(previous) = self.current.take() {
            tracing::debug!(id = previous.id, "removing highlight");
            engine.remove_feature_state(&previous);
        }
    }

    /// Re-run the highlight for buildings rendered under `target`
    pub fn highlight_at<E: MapEngine>(&mut self, engine: &mut E, target: LngLat) -> HighlightOutcome {
        let point = engine.project(target);
        let features = engine.query_rendered_features(point, &[BUILDINGS_LAYER]);
        tracing::debug!(count = features.len(), "buildings found");

        // Old highlight goes first so at most one is ever set
        self.clear(engine);

        let Some(nearest) = nearest_feature_by(&features, target, self.distance) else {
            tracing::info!("no buildings found at result location");
            return HighlightOutcome::NoBuildings;
        };

        let Some(key) = nearest.key() else {
            tracing::warn!("closest building has no usable id; nothing highlighted");
            return HighlightOutcome::MissingId;
        };

        let mut state = FeatureState::new();
        state.insert(HIGHLIGHT_FLAG.to_string(), true.into());
        engine.set_feature_state(&key, state);
        tracing::debug!(id = key.id, "highlighted building");

        let id = key.id;
        self.current = Some(key);
        HighlightOutcome::Highlighted(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_distance;
    use crate::map::{Geometry, Properties};

    fn feature(id: Option<u64>, first_vertex: LngLat) -> RenderedFeature {
        let ring = vec![
            first_vertex,
            LngLat::new(first_vertex.lng + 0.001, first_vertex.lat),
            LngLat::new(first_vertex.lng, first_vertex.lat + 0.001),
            first_vertex,
        ];
        RenderedFeature {
            id,
            layer: BUILDINGS_LAYER.to_string(),
            source: "composite".to_string(),
            source_layer: "building".to_string(),
            geometry: Geometry::Polygon(vec![ring]),
            properties: Properties::new(),
            state: FeatureState::new(),
        }
    }

    const TARGET: LngLat = LngLat::new(-77.0365, 38.8977);

    #[test]
    fn test_closest_wins() {
        let features = vec![
            feature(Some(1), LngLat::new(TARGET.lng + 0.0005, TARGET.lat)),
            feature(Some(2), LngLat::new(TARGET.lng, TARGET.lat + 0.0001)),
        ];
        let nearest = nearest_feature_by(&features, TARGET, planar_distance).unwrap();
        assert_eq!(nearest.id, Some(2));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let features = vec![
            feature(Some(7), LngLat::new(TARGET.lng + 0.0002, TARGET.lat)),
            feature(Some(8), LngLat::new(TARGET.lng - 0.0002, TARGET.lat)),
        ];
        let nearest = nearest_feature_by(&features, TARGET, planar_distance).unwrap();
        assert_eq!(nearest.id, Some(7));
    }

    #[test]
    fn test_no_anchor_falls_back_to_first() {
        let mut first = feature(Some(3), TARGET);
        first.geometry = Geometry::Polygon(vec![]);
        let mut second = feature(Some(4), TARGET);
        second.geometry = Geometry::MultiPolygon(vec![]);

        let features = vec![first, second];
        assert_eq!(nearest_feature_by(&features, TARGET, planar_distance).unwrap().id, Some(3));
        assert!(nearest_feature_by(&[], TARGET, planar_distance).is_none());
    }

    #[test]
    fn test_distance_policy_is_swappable() {
        // 0.0004° of longitude vs 0.0003° of latitude: planar prefers the
        // latitude offset, but near the pole longitude degrees are tiny.
        let polar = LngLat::new(10.0, 89.9);
        let features = vec![
            feature(Some(1), LngLat::new(polar.lng + 0.0004, polar.lat)),
            feature(Some(2), LngLat::new(polar.lng, polar.lat + 0.0003)),
        ];
        assert_eq!(nearest_feature_by(&features, polar, planar_distance).unwrap().id, Some(2));
        assert_eq!(nearest_feature_by(&features, polar, haversine_distance).unwrap().id, Some(1));
    }
}
