// src/display/gui/app.rs v2
//! Main GUI application structure and eframe::App implementation

use crate::{
    config::{MapConfig, TOKEN_ENV},
    display::{build_tile_cache, build_view},
    error::Result,
    geocode::{AddressAutofill, GeocodeMatch, Geocoder, MapboxGeocoder, RetrieveResponse, Suggestion},
    map::SceneEngine,
    view::MapView,
};
use eframe::egui;
use std::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

use super::{
    controls::render_controls,
    map_canvas::MapCanvas,
    search_bar::{SearchBar, SearchBarAction},
    status::render_status_bar,
};

/// Results handed back from background requests
enum AppEvent {
    Geocoded {
        seq: u64,
        result: Result<Vec<GeocodeMatch>>,
    },
    Suggested {
        seq: u64,
        result: Result<Vec<Suggestion>>,
    },
    Retrieved(Result<RetrieveResponse>),
}

pub struct BuildingFinderApp {
    view: MapView<SceneEngine>,
    runtime: tokio::runtime::Runtime,
    geocoder: Option<MapboxGeocoder>,
    autofill: Option<AddressAutofill>,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    search_bar: SearchBar,
    canvas: MapCanvas,
    alert: Option<String>,
    searches_in_flight: usize,
    last_frame: Instant,
}

impl BuildingFinderApp {
    pub fn new(config: &MapConfig) -> Result<Self> {
        let view = build_view(config, 1024.0, 768.0)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("building-finder-net")
            .enable_all()
            .build()?;

        let (geocoder, autofill) = match config.access_token() {
            Ok(token) => (
                Some(MapboxGeocoder::new(&config.api_base, token)?),
                Some(AddressAutofill::new(&config.api_base, token)?),
            ),
            Err(e) => {
                warn!("{}; address search is disabled", e);
                (None, None)
            }
        };

        let tile_cache = match build_tile_cache(config) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Basemap disabled: {}", e);
                None
            }
        };

        let (events_tx, events_rx) = mpsc::channel();
        Ok(Self {
            view,
            runtime,
            geocoder,
            autofill,
            events_tx,
            events_rx,
            search_bar: SearchBar::new(),
            canvas: MapCanvas::new(tile_cache),
            alert: None,
            searches_in_flight: 0,
            last_frame: Instant::now(),
        })
    }

    fn start_search(&mut self, ctx: &egui::Context) {
        let Some(geocoder) = self.geocoder.clone() else {
            self.alert = Some(format!("Set {} to search for addresses", TOKEN_ENV));
            return;
        };
        let Some(ticket) = self.view.begin_search() else {
            return;
        };

        info!(seq = ticket.seq, query = %ticket.query, "searching");
        self.searches_in_flight += 1;
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = geocoder.forward(&ticket.query).await;
            let _ = tx.send(AppEvent::Geocoded { seq: ticket.seq, result });
            ctx.request_repaint();
        });
    }

    fn request_suggestions(&mut self, ctx: &egui::Context) {
        let seq = self.search_bar.begin_suggest();
        let Some(autofill) = self.autofill.clone() else {
            return;
        };

        let text = self.view.query().trim().to_string();
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = autofill.suggest(&text).await;
            let _ = tx.send(AppEvent::Suggested { seq, result });
            ctx.request_repaint();
        });
    }

    fn retrieve(&mut self, ctx: &egui::Context, suggestion: Suggestion) {
        let Some(autofill) = self.autofill.clone() else {
            return;
        };

        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = autofill.retrieve(&suggestion).await;
            let _ = tx.send(AppEvent::Retrieved(result));
            ctx.request_repaint();
        });
    }

    /// Apply a retrieved suggestion and start a fresh autofill session
    fn on_retrieve(&mut self, response: RetrieveResponse) {
        self.view.set_query(response.full_address());
        if let Some(autofill) = &mut self.autofill {
            autofill.new_session();
        }
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Geocoded { seq, result } => {
                    self.searches_in_flight = self.searches_in_flight.saturating_sub(1);
                    let outcome = self.view.complete_search(seq, result);
                    debug!(seq, ?outcome, "search finished");
                    if let Some(message) = self.view.take_notification() {
                        self.alert = Some(message);
                    }
                }
                AppEvent::Suggested { seq, result } => match result {
                    Ok(suggestions) => {
                        if !self.search_bar.receive_suggestions(seq, suggestions) {
                            debug!(seq, "discarding stale suggestions");
                        }
                    }
                    Err(e) => warn!("Address suggestions failed: {}", e),
                },
                AppEvent::Retrieved(result) => match result {
                    Ok(response) => self.on_retrieve(response),
                    Err(e) => warn!("Address retrieve failed: {}", e),
                },
            }
        }
    }
}

impl eframe::App for BuildingFinderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame);
        self.last_frame = now;

        self.process_events();
        let animating = self.view.engine_mut().advance(dt);

        if self.search_bar.suggest_due(now, self.view.query()) {
            self.request_suggestions(ctx);
        }

        // Top search bar
        egui::TopBottomPanel::top("search_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("🏢 Building Finder");
                ui.separator();
                ui.vertical(|ui| {
                    let mut query = self.view.query().to_string();
                    let action = self.search_bar.show(ui, &mut query);
                    if query != self.view.query() {
                        self.view.set_query(query);
                    }
                    match action {
                        SearchBarAction::Search => self.start_search(ctx),
                        SearchBarAction::Pick(suggestion) => self.retrieve(ctx, suggestion),
                        SearchBarAction::None => {}
                    }
                });
            });
            ui.add_space(4.0);
        });

        // Bottom status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            render_status_bar(ui, &self.view, self.searches_in_flight > 0);
        });

        let mut loading = false;
        egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            loading = self.canvas.show(ui, &mut self.view);
        });

        egui::Area::new(egui::Id::new("map_controls"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -40.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if let Some(action) = render_controls(ui) {
                        debug!(?action, "map control");
                        action.apply(&mut self.view);
                    }
                });
            });

        if let Some(message) = self.alert.clone() {
            let mut dismissed = false;
            egui::Window::new("⚠ Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            if dismissed {
                self.alert = None;
            }
        }

        if animating || loading || self.searches_in_flight > 0 {
            ctx.request_repaint();
        } else if let Some(remaining) = self.search_bar.debounce_remaining(now) {
            ctx.request_repaint_after(remaining);
        }
    }
}
