// src/map/mod.rs v2
//! Map engine surface, in-memory scene, styling and basemap tiles

mod engine;
pub mod scene;
pub mod source;
pub mod style;
mod tile_cache;

pub use engine::{
    Camera, CameraOptions, FeatureId, FeatureKey, FeatureState, Geometry, MapEngine, MarkerId, Properties,
    RenderedFeature, ScreenPoint,
};
pub use scene::{Projector, SceneEngine};
pub use source::{SourceFeature, VectorSource};
pub use tile_cache::{CacheStats, TileCache, TileKey, TileUrlFn};
