// src/display/mod.rs
//! Display front-ends: the interactive window and a headless report

pub mod terminal;

#[cfg(feature = "gui")]
pub mod gui;

use crate::config::MapConfig;
use crate::error::Result;
use crate::geo::haversine_distance;
use crate::map::style::{BUILDING_SOURCE_LAYER, COMPOSITE_SOURCE, HOUSENUM_SOURCE_LAYER};
use crate::map::{Camera, SceneEngine, TileCache, TileKey, TileUrlFn};
use crate::view::{CameraState, MapView};
use std::sync::Arc;

/// Build a scene engine from config: initial camera plus the local building data
pub fn build_scene(config: &MapConfig, width: f64, height: f64) -> Result<SceneEngine> {
    let camera = Camera {
        center: config.initial_center,
        zoom: config.initial_zoom,
        bearing: config.initial_bearing,
        pitch: config.initial_pitch,
    };
    let mut engine = SceneEngine::new(camera, width, height);

    let source = engine.source_mut(COMPOSITE_SOURCE);
    if let Some(path) = &config.buildings_path {
        source.load_geojson_file(BUILDING_SOURCE_LAYER, path)?;
    } else {
        tracing::warn!("no buildings file configured; nothing can be highlighted");
    }
    if let Some(path) = &config.house_numbers_path {
        source.load_geojson_file(HOUSENUM_SOURCE_LAYER, path)?;
    }
    tracing::info!(features = source.feature_count(), "map data loaded");

    Ok(engine)
}

/// Create the map view over a configured scene, with layers registered
pub fn build_view(config: &MapConfig, width: f64, height: f64) -> Result<MapView<SceneEngine>> {
    let engine = build_scene(config, width, height)?;
    let mut view = MapView::new(engine, CameraState::new(config.initial_bearing, config.initial_pitch));
    if config.great_circle_nearest {
        view.highlight_mut().set_distance_fn(haversine_distance);
    }
    view.initialize()?;
    Ok(view)
}

/// Basemap tile cache in the configured directory, fetching from the configured URL template
pub fn build_tile_cache(config: &MapConfig) -> Result<TileCache> {
    let tile_config = config.clone();
    let url_for: TileUrlFn = Arc::new(move |key: TileKey| tile_config.tile_url_for(key.zoom, key.x, key.y));
    TileCache::new(config.resolved_tile_cache_dir()?, url_for)
}
