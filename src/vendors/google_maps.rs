//! Google Geocoding API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, Geocoder, VendorError};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Latitude and longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>, timeout_ms: u64) -> Result<Self, VendorError> {
        Ok(Self {
            client: http_client(timeout_ms)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn geocode_url(&self, address: &str) -> String {
        format!(
            "{}/maps/api/geocode/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(address),
            self.api_key
        )
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Coordinates,
}

impl GeocodeResponse {
    fn first_location(self) -> Option<Coordinates> {
        self.results.into_iter().next().map(|r| r.geometry.location)
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, VendorError> {
        let response = self
            .client
            .get(self.geocode_url(address))
            .send()
            .await
            .map_err(VendorError::from_transport)?;

        let response = ensure_success(response).await?;
        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| VendorError::Parse(e.to_string()))?;

        let location = body.first_location();
        if location.is_none() {
            tracing::warn!(address = %address, "Could not geocode address");
        }
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_url_encodes_address() {
        let geocoder = GoogleGeocoder::new("maps-key", 1000).unwrap();
        assert_eq!(
            geocoder.geocode_url("5000 MacArthur Blvd, Oakland, CA"),
            "https://maps.googleapis.com/maps/api/geocode/json?address=5000%20MacArthur%20Blvd%2C%20Oakland%2C%20CA&key=maps-key"
        );
    }

    #[test]
    fn test_first_location() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"status": "OK", "results": [
                {"geometry": {"location": {"lat": 37.78, "lng": -122.18}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            body.first_location(),
            Some(Coordinates { lat: 37.78, lng: -122.18 })
        );

        let none: GeocodeResponse = serde_json::from_str(r#"{"status": "ZERO_RESULTS"}"#).unwrap();
        assert_eq!(none.first_location(), None);
    }
}
