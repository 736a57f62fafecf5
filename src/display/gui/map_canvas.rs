// src/display/gui/map_canvas.rs v2
//! Map canvas: rotated basemap tiles, extruded buildings, house numbers and the marker

use crate::{
    geo::{from_world_px, to_world_px, world_size, LngLat, MAX_MERCATOR_LAT, TILE_SIZE},
    map::{
        style::{Color, LayerKind, BUILDINGS_LAYER, HOUSENUM_LAYER},
        Camera, FeatureKey, MapEngine, Projector, SceneEngine, ScreenPoint, TileCache, TileKey,
    },
    view::MapView,
};
use eframe::egui;
use std::collections::{HashMap, HashSet};

const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;
const MAX_TILE_ZOOM: u8 = 22;
/// Skip the basemap rather than request a flood of tiles at extreme tilts
const MAX_VISIBLE_TILES: usize = 96;
const MAX_TEXTURES: usize = 512;
/// Scroll distance per zoom step
const SCROLL_STEP: f32 = 50.0;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(235, 232, 226);
const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(0x3f, 0xb1, 0xce);

/// Screen-space rise of a roof above its footprint
pub fn extrusion_offset_px(height_m: f64, lat: f64, zoom: f64, pitch: f64) -> f64 {
    if height_m <= 0.0 {
        return 0.0;
    }
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let px_per_metre = world_size(zoom) / (EARTH_CIRCUMFERENCE_M * lat.to_radians().cos());
    height_m * px_per_metre * pitch.to_radians().sin()
}

/// Basemap tiles at `zoom` that intersect the viewport
pub fn visible_tiles(projector: &Projector, width: f64, height: f64, zoom: u8) -> Vec<TileKey> {
    let corners = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)];
    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for (x, y) in corners {
        let (wx, wy) = to_world_px(projector.unproject(ScreenPoint::new(x, y)), zoom as f64);
        min_x = min_x.min(wx);
        min_y = min_y.min(wy);
        max_x = max_x.max(wx);
        max_y = max_y.max(wy);
    }

    let last = 2_f64.powi(zoom as i32) - 1.0;
    let range = |lo: f64, hi: f64| {
        let lo = (lo / TILE_SIZE).floor().clamp(0.0, last) as u32;
        let hi = (hi / TILE_SIZE).floor().clamp(0.0, last) as u32;
        lo..=hi
    };

    let mut tiles = Vec::new();
    for y in range(min_y, max_y) {
        for x in range(min_x, max_x) {
            tiles.push(TileKey::new(zoom, x, y));
        }
    }
    tiles
}

fn color32(color: Color, opacity: f32) -> egui::Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, alpha)
}

fn shade(color: Color, factor: f32) -> Color {
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Color::rgb(scale(color.r), scale(color.g), scale(color.b))
}

/// One building ready to paint, in screen space
struct Extrusion {
    base: Vec<egui::Pos2>,
    rise: f32,
    color: Color,
    opacity: f32,
}

pub struct MapCanvas {
    tile_cache: Option<TileCache>,
    textures: HashMap<TileKey, egui::TextureHandle>,
    undecodable: HashSet<TileKey>,
    scroll: f32,
}

impl MapCanvas {
    pub fn new(tile_cache: Option<TileCache>) -> Self {
        Self {
            tile_cache,
            textures: HashMap::new(),
            undecodable: HashSet::new(),
            scroll: 0.0,
        }
    }

    /// Handle input and paint the map; returns whether tiles are still loading
    pub fn show(&mut self, ui: &mut egui::Ui, view: &mut MapView<SceneEngine>) -> bool {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        view.engine_mut().resize(rect.width() as f64, rect.height() as f64);

        if response.dragged() {
            let delta = response.drag_delta();
            view.engine_mut().pan_by(delta.x as f64, delta.y as f64);
        }
        if response.hovered() {
            self.scroll += ui.input(|i| i.raw_scroll_delta.y);
            if self.scroll >= SCROLL_STEP {
                view.zoom_in();
                self.scroll = 0.0;
            } else if self.scroll <= -SCROLL_STEP {
                view.zoom_out();
                self.scroll = 0.0;
            }
        }

        painter.rect_filled(rect, 0.0, BACKGROUND);

        let engine = view.engine();
        let projector = engine.display_projector();
        let to_pos = |at: LngLat| {
            let p = projector.project(at);
            egui::pos2(rect.left() + p.x as f32, rect.top() + p.y as f32)
        };

        let loading = self.render_tiles(ui.ctx(), &painter, rect, &projector, &to_pos);
        render_buildings(&painter, engine, projector.camera(), &to_pos);
        render_house_numbers(&painter, engine, projector.camera(), &to_pos);

        for (_, at) in engine.markers() {
            render_marker(&painter, to_pos(at));
        }

        loading
    }

    fn render_tiles(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        rect: egui::Rect,
        projector: &Projector,
        to_pos: &impl Fn(LngLat) -> egui::Pos2,
    ) -> bool {
        let Some(cache) = self.tile_cache.clone() else {
            return false;
        };

        let zoom = projector.camera().zoom.floor().clamp(0.0, MAX_TILE_ZOOM as f64) as u8;
        let tiles = visible_tiles(projector, rect.width() as f64, rect.height() as f64, zoom);
        if tiles.len() > MAX_VISIBLE_TILES {
            tracing::debug!(count = tiles.len(), "too many tiles in view, skipping basemap");
            return false;
        }

        if self.textures.len() > MAX_TEXTURES {
            self.textures.clear();
        }

        let mut loading = false;
        for key in tiles {
            let corners = [(0, 0), (1, 0), (1, 1), (0, 1)].map(|(dx, dy)| {
                let px = (key.x + dx) as f64 * TILE_SIZE;
                let py = (key.y + dy) as f64 * TILE_SIZE;
                to_pos(from_world_px(px, py, key.zoom as f64))
            });

            if let Some(texture) = self.texture_for(ctx, &cache, key, &mut loading) {
                let mut mesh = egui::Mesh::with_texture(texture.id());
                let uvs = [egui::pos2(0.0, 0.0), egui::pos2(1.0, 0.0), egui::pos2(1.0, 1.0), egui::pos2(0.0, 1.0)];
                for (pos, uv) in corners.into_iter().zip(uvs) {
                    mesh.vertices.push(egui::epaint::Vertex {
                        pos,
                        uv,
                        color: egui::Color32::WHITE,
                    });
                }
                mesh.add_triangle(0, 1, 2);
                mesh.add_triangle(0, 2, 3);
                painter.add(egui::Shape::mesh(mesh));
            } else {
                painter.add(egui::Shape::convex_polygon(
                    corners.to_vec(),
                    egui::Color32::from_gray(240),
                    egui::Stroke::new(0.5, egui::Color32::from_gray(220)),
                ));
            }
        }
        loading || cache.downloads_in_flight() > 0
    }

    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        cache: &TileCache,
        key: TileKey,
        loading: &mut bool,
    ) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.get(&key) {
            return Some(texture.clone());
        }
        if self.undecodable.contains(&key) {
            return None;
        }

        match cache.get_tile(key) {
            Ok(Some(bytes)) => match image::load_from_memory(&bytes) {
                Ok(image) => {
                    let size = [image.width() as usize, image.height() as usize];
                    let rgba = image.to_rgba8();
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());
                    let texture = ctx.load_texture(
                        format!("tile_{}_{}_{}", key.zoom, key.x, key.y),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.textures.insert(key, texture.clone());
                    Some(texture)
                }
                Err(e) => {
                    tracing::debug!(?key, "undecodable tile: {}", e);
                    self.undecodable.insert(key);
                    None
                }
            },
            Ok(None) => {
                cache.download_tile_async(key);
                *loading = true;
                None
            }
            Err(e) => {
                tracing::warn!(?key, "tile cache read failed: {}", e);
                self.undecodable.insert(key);
                None
            }
        }
    }
}

fn render_buildings(
    painter: &egui::Painter,
    engine: &SceneEngine,
    camera: Camera,
    to_pos: &impl Fn(LngLat) -> egui::Pos2,
) {
    let Some(layer) = engine.layers().iter().find(|l| l.id == BUILDINGS_LAYER) else {
        return;
    };
    let LayerKind::FillExtrusion(paint) = &layer.kind else {
        return;
    };
    if !layer.visible_at(camera.zoom) {
        return;
    }
    let Some(source) = engine.source(&layer.source) else {
        return;
    };

    let mut extrusions = Vec::new();
    for feature in source.features(&layer.source_layer) {
        let state = feature
            .id
            .and_then(|id| engine.feature_state(&FeatureKey::new(&layer.source, &layer.source_layer, id)));
        let color = paint.color.resolve(state);
        let height = feature.number(&paint.height_property).unwrap_or(0.0);

        for ring in feature.geometry.outer_rings() {
            let Some(first) = ring.first() else { continue };
            let rise = extrusion_offset_px(height, first.lat, camera.zoom, camera.pitch) as f32;
            extrusions.push(Extrusion {
                base: ring.iter().map(|p| to_pos(*p)).collect(),
                rise,
                color,
                opacity: paint.opacity,
            });
        }
    }

    // Back to front: footprints higher on screen are further away
    extrusions.sort_by(|a, b| {
        let depth = |e: &Extrusion| e.base.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        depth(a).total_cmp(&depth(b))
    });

    for extrusion in &extrusions {
        let up = egui::vec2(0.0, -extrusion.rise);
        let wall = color32(shade(extrusion.color, 0.75), extrusion.opacity);
        let edge = egui::Stroke::new(0.5, color32(shade(extrusion.color, 0.5), extrusion.opacity));

        if extrusion.rise > 0.5 {
            for side in extrusion.base.windows(2) {
                let (a, b) = (side[0], side[1]);
                painter.add(egui::Shape::convex_polygon(vec![a, b, b + up, a + up], wall, edge));
            }
        }

        let roof: Vec<egui::Pos2> = extrusion.base.iter().map(|p| *p + up).collect();
        painter.add(egui::Shape::convex_polygon(
            roof,
            color32(extrusion.color, extrusion.opacity),
            edge,
        ));
    }
}

fn render_house_numbers(
    painter: &egui::Painter,
    engine: &SceneEngine,
    camera: Camera,
    to_pos: &impl Fn(LngLat) -> egui::Pos2,
) {
    let Some(layer) = engine.layers().iter().find(|l| l.id == HOUSENUM_LAYER) else {
        return;
    };
    let LayerKind::Symbol(style) = &layer.kind else {
        return;
    };
    if !layer.visible_at(camera.zoom) {
        return;
    }
    let Some(source) = engine.source(&layer.source) else {
        return;
    };

    let font = egui::FontId::proportional(style.text_size);
    let halo = color32(style.halo_color, 1.0);
    let text_color = color32(style.text_color, 1.0);
    let anchor = egui::Align2::CENTER_CENTER;
    let mut placed: Vec<egui::Rect> = Vec::new();

    for feature in source.features(&layer.source_layer) {
        let (Some(at), Some(text)) = (feature.geometry.anchor_vertex(), feature.text(&style.text_field)) else {
            continue;
        };
        let pos = to_pos(at);
        if !painter.clip_rect().contains(pos) {
            continue;
        }

        let galley = painter.layout_no_wrap(text.clone(), font.clone(), text_color);
        let bounds = anchor.anchor_size(pos, galley.size());
        if !style.allow_overlap && placed.iter().any(|r| r.intersects(bounds)) {
            continue;
        }
        placed.push(bounds);

        let w = style.halo_width;
        for (dx, dy) in [(-w, 0.0), (w, 0.0), (0.0, -w), (0.0, w), (-w, -w), (w, w), (-w, w), (w, -w)] {
            painter.text(pos + egui::vec2(dx, dy), anchor, &text, font.clone(), halo);
        }
        painter.text(pos, anchor, &text, font.clone(), text_color);
    }
}

/// Teardrop pin with its tip on the location
fn render_marker(painter: &egui::Painter, tip: egui::Pos2) {
    let head = tip - egui::vec2(0.0, 22.0);
    painter.add(egui::Shape::convex_polygon(
        vec![tip, head + egui::vec2(7.5, 4.0), head + egui::vec2(-7.5, 4.0)],
        MARKER_COLOR,
        egui::Stroke::NONE,
    ));
    painter.circle_filled(head, 9.0, MARKER_COLOR);
    painter.circle_filled(head, 3.5, egui::Color32::WHITE);
}
