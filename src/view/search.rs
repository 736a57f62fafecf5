// src/view/search.rs
//! Search tickets and results

use crate::geo::LngLat;
use crate::map::FeatureId;
use chrono::{DateTime, Utc};

/// One issued search; only the latest ticket may apply its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// Issues monotonically increasing search sequence numbers
#[derive(Debug, Clone, Default)]
pub struct SearchSequence {
    latest: u64,
}

impl SearchSequence {
    pub fn issue(&mut self, query: &str) -> SearchTicket {
        self.latest += 1;
        SearchTicket {
            seq: self.latest,
            query: query.to_string(),
        }
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// The location the map last flew to
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult {
    pub location: LngLat,
    pub name: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

impl GeoResult {
    pub fn lat(&self) -> f64 {
        self.location.lat
    }

    pub fn lng(&self) -> f64 {
        self.location.lng
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Camera moved, marker replaced; `highlighted` is the building now lit, if any
    Applied {
        result: GeoResult,
        highlighted: Option<FeatureId>,
    },
    /// The geocoder had no match; nothing changed
    NoResult,
    /// The request failed; a notification was raised
    Failed(String),
    /// A newer search was issued before this one completed; ignored
    Stale,
}
