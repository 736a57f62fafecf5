// src/map/style.rs
//! Layer definitions for extruded buildings and house-number labels

use super::engine::{FeatureState, MapEngine};
use crate::error::Result;

pub const COMPOSITE_SOURCE: &str = "composite";
pub const BUILDING_SOURCE_LAYER: &str = "building";
pub const HOUSENUM_SOURCE_LAYER: &str = "housenum_label";

pub const BUILDINGS_LAYER: &str = "3d-buildings";
pub const HOUSENUM_LAYER: &str = "housenum-label";

/// Feature-state flag that switches a building to the accent color
pub const HIGHLIGHT_FLAG: &str = "highlighted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Color that may depend on a feature's state
#[derive(Debug, Clone, PartialEq)]
pub enum ColorExpr {
    /// `when_true` if the boolean state flag is set, otherwise `otherwise`
    StateFlag {
        flag: String,
        when_true: Color,
        otherwise: Color,
    },
}

impl ColorExpr {
    pub fn resolve(&self, state: Option<&FeatureState>) -> Color {
        match self {
            ColorExpr::StateFlag { flag, when_true, otherwise } => {
                let set = state
                    .and_then(|s| s.get(flag))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if set {
                    *when_true
                } else {
                    *otherwise
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillExtrusionPaint {
    pub color: ColorExpr,
    /// Feature property holding the height in metres
    pub height_property: String,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStyle {
    /// Feature property holding the label text
    pub text_field: String,
    pub text_size: f32,
    pub allow_overlap: bool,
    pub text_color: Color,
    pub halo_color: Color,
    pub halo_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    FillExtrusion(FillExtrusionPaint),
    Symbol(SymbolStyle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub source_layer: String,
    pub min_zoom: f64,
    pub kind: LayerKind,
}

impl LayerSpec {
    pub fn visible_at(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom
    }
}

/// Extruded building footprints, red when highlighted
pub fn buildings_layer() -> LayerSpec {
    LayerSpec {
        id: BUILDINGS_LAYER.to_string(),
        source: COMPOSITE_SOURCE.to_string(),
        source_layer: BUILDING_SOURCE_LAYER.to_string(),
        min_zoom: 15.0,
        kind: LayerKind::FillExtrusion(FillExtrusionPaint {
            color: ColorExpr::StateFlag {
                flag: HIGHLIGHT_FLAG.to_string(),
                when_true: Color::rgb(0xff, 0x00, 0x00),
                otherwise: Color::rgb(0xaa, 0xaa, 0xaa),
            },
            height_property: "height".to_string(),
            opacity: 0.6,
        }),
    }
}

/// House numbers, only at street-level zoom
pub fn house_numbers_layer() -> LayerSpec {
    LayerSpec {
        id: HOUSENUM_LAYER.to_string(),
        source: COMPOSITE_SOURCE.to_string(),
        source_layer: HOUSENUM_SOURCE_LAYER.to_string(),
        min_zoom: 19.0,
        kind: LayerKind::Symbol(SymbolStyle {
            text_field: "house_num".to_string(),
            text_size: 18.0,
            allow_overlap: true,
            text_color: Color::rgb(0, 0, 0),
            halo_color: Color::rgb(0xff, 0xff, 0xff),
            halo_width: 2.0,
        }),
    }
}

/// Register the application layers, skipping any that already exist.
///
/// Returns how many layers were added; calling it again adds none.
pub fn init_layers<E: MapEngine>(engine: &mut E) -> Result<usize> {
    let mut added = 0;
    for layer in [buildings_layer(), house_numbers_layer()] {
        if engine.has_layer(&layer.id) {
            tracing::debug!(layer = %layer.id, "layer already registered");
            continue;
        }
        tracing::debug!(layer = %layer.id, "registering layer");
        engine.add_layer(layer)?;
        added += 1;
    }
    Ok(added)
}
