//! Configuration management for the travel assistant
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. The loaded
//! configuration is injected into every component at construction.

use crate::AssistantError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the travel assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Geocoding configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Device location configuration
    #[serde(default)]
    pub location: LocationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the query is turned into an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// The model fills the query schema and the orchestrator does the lookups
    #[default]
    Structured,
    /// The model calls the lookup tools itself and writes the reply
    ToolCalling,
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Bearer token for the endpoint
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u32,
    /// Upper bound on model/tool round trips in tool-calling mode
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Extraction mode used for every request
    #[serde(default)]
    pub mode: ExtractionMode,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Use Open-Meteo as the primary tier
    #[serde(default = "default_true")]
    pub open_meteo_enabled: bool,
    /// Base URL for the Open-Meteo forecast API
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,
    /// OpenWeatherMap API key; the secondary tier is skipped without it
    pub openweathermap_api_key: Option<String>,
    /// Base URL for the OpenWeatherMap API
    #[serde(default = "default_openweathermap_base_url")]
    pub openweathermap_base_url: String,
    /// Language for provider condition text
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-tier timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    /// Transient-error retries per HTTP request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the synthetic placeholder is returned
    #[serde(default = "default_synthetic_delay_ms")]
    pub synthetic_delay_ms: u64,
}

/// Geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Preferred language for place names
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
}

/// Where the device location comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationProvider {
    /// Approximate location from the public IP address
    #[default]
    Ip,
    /// Fixed coordinate from this configuration
    Static,
    /// Behaves like a denied location permission
    Disabled,
}

/// Device location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub provider: LocationProvider,
    /// Latitude for the static provider
    pub latitude: Option<f64>,
    /// Longitude for the static provider
    pub longitude: Option<f64>,
    /// IP geolocation endpoint
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    /// How long to wait for a fix, in seconds
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u32 {
    30
}

fn default_max_tool_rounds() -> u32 {
    6
}

fn default_true() -> bool {
    true
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_openweathermap_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    1
}

fn default_synthetic_delay_ms() -> u64 {
    500
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_location_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_seconds: default_llm_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
            mode: ExtractionMode::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            open_meteo_enabled: true,
            open_meteo_base_url: default_open_meteo_base_url(),
            openweathermap_api_key: None,
            openweathermap_base_url: default_openweathermap_base_url(),
            language: default_language(),
            timeout_seconds: default_provider_timeout(),
            max_retries: default_max_retries(),
            synthetic_delay_ms: default_synthetic_delay_ms(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            language: default_language(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: LocationProvider::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
            timeout_seconds: default_location_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn synthetic_delay(&self) -> Duration {
        Duration::from_millis(self.synthetic_delay_ms)
    }
}

impl LocationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AssistantConfig {
    /// Load configuration from a file and environment variables
    ///
    /// An explicit `config_path` must be readable; the default location is
    /// skipped when absent.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = match config_path {
            Some(path) => Some(path),
            None => Self::get_config_path().filter(|path| path.exists()),
        };

        if let Some(path) = config_file {
            let contents = std::fs::read_to_string(&path)
                .map_err(AssistantError::from)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            builder = builder.add_source(File::from_str(&contents, config::FileFormat::Toml));
        }

        // TRAVEL_ASSISTANT_WEATHER__OPENWEATHERMAP_API_KEY -> weather.openweathermap_api_key
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_ASSISTANT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AssistantConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-assistant").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.llm.endpoint.is_empty() {
            self.llm.endpoint = default_llm_endpoint();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.llm.max_tool_rounds == 0 {
            self.llm.max_tool_rounds = default_max_tool_rounds();
        }
        if self.weather.open_meteo_base_url.is_empty() {
            self.weather.open_meteo_base_url = default_open_meteo_base_url();
        }
        if self.weather.openweathermap_base_url.is_empty() {
            self.weather.openweathermap_base_url = default_openweathermap_base_url();
        }
        if self.weather.language.is_empty() {
            self.weather.language = default_language();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_provider_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.language.is_empty() {
            self.geocoding.language = default_language();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_provider_timeout();
        }
        if self.location.ip_lookup_url.is_empty() {
            self.location.ip_lookup_url = default_ip_lookup_url();
        }
        if self.location.timeout_seconds == 0 {
            self.location.timeout_seconds = default_location_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_location()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("LLM API key", &self.llm.api_key),
            ("OpenWeatherMap API key", &self.weather.openweathermap_api_key),
        ];

        for (label, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(AssistantError::config(format!(
                        "{label} cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("LLM", self.llm.timeout_seconds),
            ("Weather API", self.weather.timeout_seconds),
            ("Geocoding API", self.geocoding.timeout_seconds),
            ("Location", self.location.timeout_seconds),
        ];

        for (label, seconds) in timeouts {
            if seconds > 300 {
                return Err(AssistantError::config(format!(
                    "{label} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.llm.max_tool_rounds > 20 {
            return Err(AssistantError::config("LLM max tool rounds cannot exceed 20").into());
        }

        if self.weather.max_retries > 10 {
            return Err(AssistantError::config("Weather API max retries cannot exceed 10").into());
        }

        Ok(())
    }

    /// Validate the static location, when selected
    fn validate_location(&self) -> Result<()> {
        if self.location.provider != LocationProvider::Static {
            return Ok(());
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AssistantError::config(format!(
                        "Static location ({lat}, {lon}) is out of range"
                    ))
                    .into());
                }
                Ok(())
            }
            _ => Err(AssistantError::config(
                "Static location provider requires both latitude and longitude",
            )
            .into()),
        }
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AssistantError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AssistantError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("LLM endpoint", &self.llm.endpoint),
            ("Open-Meteo base URL", &self.weather.open_meteo_base_url),
            ("OpenWeatherMap base URL", &self.weather.openweathermap_base_url),
            ("Geocoding base URL", &self.geocoding.base_url),
            ("IP lookup URL", &self.location.ip_lookup_url),
        ];

        for (label, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AssistantError::config(format!(
                    "{label} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
