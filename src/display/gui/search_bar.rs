// src/display/gui/search_bar.rs
//! Address input with autocomplete suggestions

use crate::geocode::Suggestion;
use eframe::egui;
use std::time::{Duration, Instant};

/// Quiet period after the last keystroke before asking for suggestions
const SUGGEST_DEBOUNCE: Duration = Duration::from_millis(300);
const MIN_SUGGEST_CHARS: usize = 3;

/// What the user did with the search bar this frame
#[derive(Debug, Clone, PartialEq)]
pub enum SearchBarAction {
    None,
    Search,
    Pick(Suggestion),
}

#[derive(Default)]
pub struct SearchBar {
    suggestions: Vec<Suggestion>,
    last_edit: Option<Instant>,
    /// Latest suggest request; older responses are ignored
    suggest_seq: u64,
    dropdown_open: bool,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keystroke; closes the dropdown until fresh suggestions arrive
    pub fn note_edit(&mut self, now: Instant) {
        self.last_edit = Some(now);
        self.dropdown_open = false;
    }

    /// Whether the debounce has elapsed for a query long enough to suggest on.
    ///
    /// Once the debounce has elapsed on a query that is too short, the edit is
    /// dropped so nothing stays pending.
    pub fn suggest_due(&mut self, now: Instant, query: &str) -> bool {
        let Some(edited) = self.last_edit else {
            return false;
        };
        if now.duration_since(edited) < SUGGEST_DEBOUNCE {
            return false;
        }
        if query.trim().chars().count() < MIN_SUGGEST_CHARS {
            self.last_edit = None;
            return false;
        }
        true
    }

    /// Time left until the pending debounce fires, if one is pending
    pub fn debounce_remaining(&self, now: Instant) -> Option<Duration> {
        self.last_edit
            .map(|edited| SUGGEST_DEBOUNCE.saturating_sub(now.duration_since(edited)))
    }

    /// Mark the pending edit as sent and return the request's sequence number
    pub fn begin_suggest(&mut self) -> u64 {
        self.last_edit = None;
        self.suggest_seq += 1;
        self.suggest_seq
    }

    /// Accept suggestions for request `seq`; returns false if they were stale
    pub fn receive_suggestions(&mut self, seq: u64, suggestions: Vec<Suggestion>) -> bool {
        if seq != self.suggest_seq {
            return false;
        }
        self.dropdown_open = !suggestions.is_empty();
        self.suggestions = suggestions;
        true
    }

    pub fn close(&mut self) {
        self.dropdown_open = false;
        self.last_edit = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, query: &mut String) -> SearchBarAction {
        let mut action = SearchBarAction::None;

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(query)
                    .hint_text("Enter an address")
                    .desired_width(320.0),
            );

            if response.changed() {
                self.note_edit(Instant::now());
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.close();
                action = SearchBarAction::Search;
            }

            if ui.button("🔍 Search").clicked() {
                self.close();
                action = SearchBarAction::Search;
            }
        });

        if self.dropdown_open {
            ui.group(|ui| {
                ui.set_width(320.0);
                for suggestion in &self.suggestions {
                    if ui.selectable_label(false, &suggestion.full_address).clicked() {
                        action = SearchBarAction::Pick(suggestion.clone());
                    }
                }
            });
            if matches!(action, SearchBarAction::Pick(_)) {
                self.close();
            }
        }

        action
    }
}
