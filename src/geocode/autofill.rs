// src/geocode/autofill.rs
//! Address autocomplete backed by the Mapbox Address Autofill API

use super::mapbox::http_client;
use crate::error::{MapError, Result};
use reqwest::Url;
use serde::Deserialize;

/// One autocomplete candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub full_address: String,
    pub action_id: String,
}

#[derive(Debug, Deserialize)]
struct RawSuggestions {
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    full_address: Option<String>,
    address_line1: Option<String>,
    action: Option<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    id: String,
}

/// Feature collection returned when a suggestion is retrieved
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub features: Vec<RetrievedFeature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievedFeature {
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl RetrieveResponse {
    /// Formatted address of the first feature, or an empty string
    pub fn full_address(&self) -> String {
        self.features
            .first()
            .and_then(|f| f.properties.get("full_address"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Autofill client; one session token per typing session
#[derive(Clone)]
pub struct AddressAutofill {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    session_token: String,
}

impl AddressAutofill {
    pub fn new(api_base: &str, access_token: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            session_token: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Start a new billing session (after a suggestion has been retrieved)
    pub fn new_session(&mut self) {
        self.session_token = uuid::Uuid::new_v4().to_string();
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>> {
        let url = self.url(&["autofill", "v1", "suggest", text])?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("session_token", self.session_token.as_str()),
                ("types", "address"),
                ("language", "en"),
            ])
            .send()
            .await?
            .error_for_status()?;

        parse_suggestions(&response.text().await?)
    }

    pub async fn retrieve(&self, suggestion: &Suggestion) -> Result<RetrieveResponse> {
        let url = self.url(&["autofill", "v1", "retrieve", &suggestion.action_id])?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("session_token", self.session_token.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(serde_json::from_str(&response.text().await?)?)
    }

    /// Join path segments onto the API base, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| MapError::Config(format!("Invalid API base {}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| MapError::Config(format!("API base cannot take a path: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Parse a suggest response, dropping entries that cannot be retrieved
pub(crate) fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>> {
    let raw: RawSuggestions = serde_json::from_str(body)?;

    Ok(raw
        .suggestions
        .into_iter()
        .filter_map(|s| {
            let action_id = s.action?.id;
            let full_address = s.full_address.or(s.address_line1)?;
            Some(Suggestion { full_address, action_id })
        })
        .collect())
}
