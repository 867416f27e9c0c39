//! Primary weather tier: Open-Meteo current conditions

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::WeatherFailure;
use crate::http::{self, redact};
use crate::models::Coordinate;

/// Open-Meteo forecast API client (no API key required)
pub struct OpenMeteoWeather {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Current conditions response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    #[serde(rename = "temperature_2m")]
    temperature: f32,
    #[serde(rename = "weather_code")]
    weather_code: u8,
}

impl OpenMeteoWeather {
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            http::build_client(config.timeout(), config.max_retries)?,
            config.open_meteo_base_url.clone(),
        ))
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn current_url(&self, coord: Coordinate) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,weather_code",
            self.base_url, coord.latitude, coord.longitude
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    fn name(&self) -> &str {
        "open-meteo"
    }

    #[instrument(name = "open_meteo_current", skip(self), fields(coord = %coord))]
    async fn current_summary(&self, coord: Coordinate) -> Result<String, WeatherFailure> {
        let url = self.current_url(coord);
        debug!("OpenMeteo API request URL: {}", redact(&url));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherFailure::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherFailure::Status(response.status().as_u16()));
        }

        let body: CurrentResponse = response
            .json()
            .await
            .map_err(|e| WeatherFailure::Decode(e.to_string()))?;

        let current = body
            .current
            .ok_or_else(|| WeatherFailure::Decode("No current weather data in response".into()))?;

        Ok(format_current(&current))
    }
}

fn format_current(current: &CurrentData) -> String {
    format!(
        "Temperature: {:.1}°C, Condition: {}",
        current.temperature,
        weather_code_to_description(current.weather_code)
    )
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
