//! Weather resolution with a tiered fallback chain
//!
//! `WeatherResolver::summarize` never fails: it walks primary -> secondary
//! and ends at a synthetic placeholder when both providers are down.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::error::WeatherFailure;
use crate::models::{Coordinate, ProviderTier, WeatherSummary};

pub mod open_meteo;
pub mod openweathermap;
pub mod synthetic;

pub use open_meteo::OpenMeteoWeather;
pub use openweathermap::OpenWeatherMap;
pub use synthetic::SyntheticWeather;

/// A weather source that turns a coordinate into summary text
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn current_summary(&self, coord: Coordinate) -> Result<String, WeatherFailure>;
}

/// Coordinate -> weather summary, always producing a result
pub struct WeatherResolver {
    primary: Option<Arc<dyn WeatherProvider>>,
    secondary: Option<Arc<dyn WeatherProvider>>,
    synthetic: SyntheticWeather,
    tier_timeout: Duration,
}

impl WeatherResolver {
    pub fn new(
        primary: Option<Arc<dyn WeatherProvider>>,
        secondary: Option<Arc<dyn WeatherProvider>>,
        synthetic: SyntheticWeather,
        tier_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            synthetic,
            tier_timeout,
        }
    }

    /// Wire up the HTTP providers described by the configuration
    pub fn from_config(config: &WeatherConfig) -> anyhow::Result<Self> {
        let primary: Option<Arc<dyn WeatherProvider>> = if config.open_meteo_enabled {
            Some(Arc::new(OpenMeteoWeather::new(config)?))
        } else {
            debug!("Open-Meteo disabled, primary weather tier skipped");
            None
        };

        let secondary: Option<Arc<dyn WeatherProvider>> = match &config.openweathermap_api_key {
            Some(_) => Some(Arc::new(OpenWeatherMap::new(config)?)),
            None => {
                debug!("No OpenWeatherMap API key, secondary weather tier skipped");
                None
            }
        };

        Ok(Self::new(
            primary,
            secondary,
            SyntheticWeather::new(config.synthetic_delay()),
            config.timeout(),
        ))
    }

    /// Summarize the current weather at `coord`
    #[instrument(skip(self), fields(coord = %coord))]
    pub async fn summarize(&self, coord: Coordinate) -> WeatherSummary {
        let tiers = [
            (ProviderTier::Primary, &self.primary),
            (ProviderTier::Secondary, &self.secondary),
        ];

        for (tier, provider) in tiers {
            let Some(provider) = provider else {
                continue;
            };

            match self.try_tier(provider.as_ref(), coord).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(tier = %tier, provider = provider.name(), "Weather summary resolved");
                    return WeatherSummary::new(text, tier);
                }
                Ok(_) => {
                    warn!(tier = %tier, provider = provider.name(), "Weather provider returned empty text, falling back");
                }
                Err(e) => {
                    warn!(tier = %tier, provider = provider.name(), error = %e, "Weather provider failed, falling back");
                }
            }
        }

        let summary = self.synthetic.summary().await;
        info!(tier = %summary.tier, "Using synthetic weather summary");
        summary
    }

    async fn try_tier(
        &self,
        provider: &dyn WeatherProvider,
        coord: Coordinate,
    ) -> Result<String, WeatherFailure> {
        match tokio::time::timeout(self.tier_timeout, provider.current_summary(coord)).await {
            Ok(result) => result,
            Err(_) => Err(WeatherFailure::Timeout(self.tier_timeout.as_secs())),
        }
    }
}
