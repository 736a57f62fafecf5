// src/geocode/mapbox.rs
//! Mapbox forward-geocoding client

use super::{parse_geocode_response, GeocodeMatch, Geocoder};
use crate::error::Result;
use std::future::Future;
use std::time::Duration;

const USER_AGENT: &str = "BuildingFinder/0.1 (Rust map search application)";

/// Build the shared async HTTP client used for Mapbox search endpoints
pub(crate) fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Client for the Mapbox Geocoding v6 forward endpoint
#[derive(Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl MapboxGeocoder {
    pub fn new(api_base: &str, access_token: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/search/geocode/v6/forward", self.api_base)
    }
}

impl Geocoder for MapboxGeocoder {
    fn forward(&self, query: &str) -> impl Future<Output = Result<Vec<GeocodeMatch>>> + Send {
        // Query string values are percent-encoded by reqwest
        let request = self
            .client
            .get(self.endpoint())
            .query(&[("q", query), ("access_token", self.access_token.as_str())]);
        let query = query.to_string();

        async move {
            tracing::debug!(%query, "forward geocode request");
            let response = request.send().await?.error_for_status()?;
            let body = response.text().await?;
            let matches = parse_geocode_response(&body)?;
            tracing::debug!(%query, matches = matches.len(), "forward geocode response");
            Ok(matches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let geocoder = MapboxGeocoder::new("https://api.mapbox.com/", "pk.test").unwrap();
        assert_eq!(geocoder.endpoint(), "https://api.mapbox.com/search/geocode/v6/forward");
    }

    #[test]
    fn test_query_is_url_encoded() {
        let geocoder = MapboxGeocoder::new("https://api.mapbox.com", "pk.test").unwrap();
        let request = geocoder
            .client
            .get(geocoder.endpoint())
            .query(&[("q", "1600 Pennsylvania Ave & 5th"), ("access_token", "pk.test")])
            .build()
            .unwrap();

        let query = request.url().query().unwrap();
        assert!(query.contains("q=1600+Pennsylvania+Ave+%26+5th"));
        assert!(query.contains("access_token=pk.test"));
    }
}
