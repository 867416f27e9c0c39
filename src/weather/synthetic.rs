//! Last weather tier: a clearly labeled placeholder

use rand::RngExt;
use std::time::Duration;

use crate::models::{ProviderTier, WeatherSummary};

/// Prefix that marks a summary as simulated
pub const SYNTHETIC_LABEL: &str = "Simulated data";

const MOCK_TEMPERATURES: [i32; 7] = [18, 22, 25, 28, 30, 26, 23];
const MOCK_CONDITIONS: [&str; 6] = [
    "Sunny",
    "Cloudy",
    "Overcast",
    "Light rain",
    "Heavy rain",
    "Thunderstorm",
];

/// Placeholder generator used when every real provider failed
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    delay: Duration,
}

impl SyntheticWeather {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Wait the simulated delay, then return a synthetic summary
    pub async fn summary(&self) -> WeatherSummary {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut rng = rand::rng();
        let temperature = MOCK_TEMPERATURES[rng.random_range(0..MOCK_TEMPERATURES.len())];
        let condition = MOCK_CONDITIONS[rng.random_range(0..MOCK_CONDITIONS.len())];

        WeatherSummary::new(
            format!("{SYNTHETIC_LABEL} - Temperature: {temperature}°C, Condition: {condition}, Humidity: 65%"),
            ProviderTier::Synthetic,
        )
    }
}
