//! Secondary weather tier: OpenWeatherMap current weather (metric units)

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::WeatherFailure;
use crate::http::{self, redact};
use crate::models::Coordinate;

/// Keyed OpenWeatherMap client
pub struct OpenWeatherMap {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    language: String,
}

/// `/weather` response body
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainData,
    weather: Vec<Condition>,
    name: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct MainData {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Condition {
    main: String,
    description: String,
}

impl OpenWeatherMap {
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            http::build_client(config.timeout(), config.max_retries)?,
            config.openweathermap_base_url.clone(),
            config.openweathermap_api_key.clone(),
            config.language.clone(),
        ))
    }

    pub fn with_client(
        client: ClientWithMiddleware,
        base_url: String,
        api_key: Option<String>,
        language: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            language,
        }
    }

    fn weather_url(&self, coord: Coordinate, api_key: &str) -> String {
        format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric&lang={}",
            self.base_url,
            coord.latitude,
            coord.longitude,
            urlencoding::encode(api_key),
            urlencoding::encode(&self.language)
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    fn name(&self) -> &str {
        "openweathermap"
    }

    #[instrument(name = "openweathermap_current", skip(self), fields(coord = %coord))]
    async fn current_summary(&self, coord: Coordinate) -> Result<String, WeatherFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherFailure::NotConfigured("missing OpenWeatherMap API key".into()))?;

        let url = self.weather_url(coord, api_key);
        debug!("OpenWeatherMap request: {}", redact(&url));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherFailure::Network(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(WeatherFailure::Status(response.status().as_u16()));
        }

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(|e| WeatherFailure::Decode(e.to_string()))?;

        Ok(format_weather(&body))
    }
}

fn format_weather(body: &WeatherResponse) -> String {
    let condition = body
        .weather
        .first()
        .map_or("Unknown", |c| c.description.as_str());
    format!(
        "{} - Temperature: {}°C, Condition: {}, Humidity: {}%",
        body.name,
        body.main.temp.round() as i64,
        condition,
        body.main.humidity
    )
}
