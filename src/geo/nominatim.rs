//! Nominatim (OpenStreetMap) forward and reverse geocoding

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::Geocoder;
use crate::config::GeocodingConfig;
use crate::error::GeocodeFailure;
use crate::http;
use crate::models::Coordinate;

/// Geocoding client for a Nominatim-compatible API
pub struct NominatimGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    language: String,
}

/// One `search` hit; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// `reverse` response; `error` is set when nothing is there
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    name: Option<String>,
    display_name: Option<String>,
    error: Option<String>,
}

impl SearchHit {
    fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lon = self.lon.parse::<f64>().ok()?;
        Some(Coordinate::new(lat, lon))
    }
}

impl ReverseResponse {
    fn place_name(self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        self.name
            .filter(|n| !n.trim().is_empty())
            .or(self.display_name)
            .filter(|n| !n.trim().is_empty())
    }
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> anyhow::Result<Self> {
        let timeout = std::time::Duration::from_secs(config.timeout_seconds.into());
        Ok(Self::with_client(
            http::build_client(timeout, 1)?,
            config.base_url.clone(),
            config.language.clone(),
        ))
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: String, language: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GeocodeFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodeFailure::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeFailure::Provider(format!(
                "geocoding request failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GeocodeFailure::Provider(format!("Failed to parse geocoding response: {e}")))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn forward(&self, place_name: &str) -> Result<Coordinate, GeocodeFailure> {
        let url = format!(
            "{}/search?q={}&format=jsonv2&limit=1&accept-language={}",
            self.base_url,
            urlencoding::encode(place_name),
            urlencoding::encode(&self.language)
        );
        debug!("Geocoding location: '{}'", place_name);

        let hits: Vec<SearchHit> = self.get_json(&url).await?;
        let Some(hit) = hits.into_iter().next() else {
            warn!("No results found for location '{}'", place_name);
            return Err(GeocodeFailure::NoMatch(place_name.to_string()));
        };

        let coord = hit
            .coordinate()
            .ok_or_else(|| GeocodeFailure::Provider(format!("unparsable coordinate {}, {}", hit.lat, hit.lon)))?;

        info!(
            "Found '{}' at ({:.4}, {:.4})",
            hit.display_name.as_deref().unwrap_or(place_name),
            coord.latitude,
            coord.longitude
        );
        Ok(coord)
    }

    #[instrument(skip(self), fields(coord = %coord))]
    async fn reverse(&self, coord: Coordinate) -> Result<String, GeocodeFailure> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=jsonv2&accept-language={}",
            self.base_url,
            coord.latitude,
            coord.longitude,
            urlencoding::encode(&self.language)
        );

        let response: ReverseResponse = self.get_json(&url).await?;
        response
            .place_name()
            .ok_or_else(|| GeocodeFailure::NoMatch(coord.format_coordinates()))
    }
}
