// src/error.rs
//! Error types for the building finder

use std::fmt;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    /// Response or data file had an unexpected shape
    Parse(String),
    /// Style or layer registration problem
    Style(String),
    Config(String),
    /// Window or graphics backend failure; kept as text so the error stays `Send`
    Gui(String),
    Other(String),
}

impl MapError {
    /// Whether this error came from talking to a remote service or reading its reply.
    ///
    /// These are the failures a search surfaces to the user as an alert.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, MapError::Http(_) | MapError::Json(_) | MapError::Parse(_))
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::Json(e) => write!(f, "JSON error: {}", e),
            MapError::Http(e) => write!(f, "HTTP error: {}", e),
            MapError::Parse(msg) => write!(f, "Parse error: {}", msg),
            MapError::Style(msg) => write!(f, "Style error: {}", msg),
            MapError::Config(msg) => write!(f, "Config error: {}", msg),
            MapError::Gui(msg) => write!(f, "GUI error: {}", msg),
            MapError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {}

impl From<std::io::Error> for MapError {
    fn from(error: std::io::Error) -> Self {
        MapError::Io(error)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(error: serde_json::Error) -> Self {
        MapError::Json(error)
    }
}

impl From<reqwest::Error> for MapError {
    fn from(error: reqwest::Error) -> Self {
        MapError::Http(error)
    }
}

#[cfg(feature = "gui")]
impl From<eframe::Error> for MapError {
    fn from(error: eframe::Error) -> Self {
        MapError::Gui(error.to_string())
    }
}

impl From<anyhow::Error> for MapError {
    fn from(error: anyhow::Error) -> Self {
        MapError::Other(error.to_string())
    }
}
