//! Query orchestration
//!
//! Sequences extraction, location resolution and weather lookups for one
//! request. Only an extraction failure is returned as an error; every
//! geocoding, location or weather problem just leaves fields unset.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{AssistantConfig, ExtractionMode};
use crate::error::OrchestrationError;
use crate::extractor::StructuredExtractor;
use crate::geo::GeoResolver;
use crate::llm::{LanguageModel, OpenAiChatModel, ToolRegistry};
use crate::models::{Coordinate, TravelQuery, TravelResponse, WeatherSummary};
use crate::tools::travel_tools;
use crate::weather::WeatherResolver;

/// What the assistant produced for one query
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    /// Fields resolved by the orchestrator
    Structured(TravelResponse),
    /// Paragraph written by the model after calling the tools itself
    Composed(String),
}

/// Resolved start side of a request
struct StartSide {
    name: Option<String>,
    weather: Option<WeatherSummary>,
}

/// Resolved destination side of a request
struct DestinationSide {
    name: String,
    weather: WeatherSummary,
}

pub struct QueryOrchestrator {
    extractor: StructuredExtractor,
    geo: Arc<GeoResolver>,
    weather: Arc<WeatherResolver>,
    tools: ToolRegistry,
    mode: ExtractionMode,
}

impl QueryOrchestrator {
    pub fn new(
        extractor: StructuredExtractor,
        geo: Arc<GeoResolver>,
        weather: Arc<WeatherResolver>,
        mode: ExtractionMode,
    ) -> Self {
        let tools = travel_tools(Arc::clone(&geo), Arc::clone(&weather));
        Self {
            extractor,
            geo,
            weather,
            tools,
            mode,
        }
    }

    /// Build the orchestrator and all providers from configuration
    pub fn from_config(config: &AssistantConfig) -> anyhow::Result<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAiChatModel::new(&config.llm)?);
        let extractor = StructuredExtractor::new(model, config.llm.max_tool_rounds as usize);
        let geo = Arc::new(GeoResolver::from_config(config)?);
        let weather = Arc::new(WeatherResolver::from_config(&config.weather)?);
        Ok(Self::new(extractor, geo, weather, config.llm.mode))
    }

    #[must_use]
    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Answer a query using the configured mode
    pub async fn answer(&self, input_text: &str) -> Result<AssistantReply, OrchestrationError> {
        match self.mode {
            ExtractionMode::Structured => self
                .process_travel_query(input_text)
                .await
                .map(AssistantReply::Structured),
            ExtractionMode::ToolCalling => self
                .compose_travel_reply(input_text)
                .await
                .map(AssistantReply::Composed),
        }
    }

    /// Extract, resolve both sides and assemble the response
    #[instrument(skip(self))]
    pub async fn process_travel_query(
        &self,
        input_text: &str,
    ) -> Result<TravelResponse, OrchestrationError> {
        let query = self.extractor.extract(input_text).await?;

        let start = self.resolve_start(&query).await;
        let destination = self.resolve_destination(&query).await;

        let (destination, destination_weather) = match destination {
            Some(side) => (Some(side.name), Some(side.weather)),
            None => (None, None),
        };

        let response = TravelResponse {
            start_location: start.name,
            start_weather: start.weather,
            destination,
            destination_weather,
        };

        info!(
            start = response.start_location.is_some(),
            start_weather = ?response.start_weather.as_ref().map(|w| w.tier),
            destination = response.destination.is_some(),
            destination_weather = ?response.destination_weather.as_ref().map(|w| w.tier),
            "Travel query processed"
        );
        Ok(response)
    }

    /// Let the model drive the lookups and return its reply unmodified
    #[instrument(skip(self))]
    pub async fn compose_travel_reply(&self, input_text: &str) -> Result<String, OrchestrationError> {
        Ok(self
            .extractor
            .compose_with_tools(input_text, &self.tools)
            .await?)
    }

    async fn resolve_start(&self, query: &TravelQuery) -> StartSide {
        match &query.start_location {
            Some(name) => {
                let weather = match self.geo.forward(name).await {
                    Some(coord) => Some(self.weather.summarize(coord).await),
                    None => {
                        warn!("Start location '{}' not found, skipping its weather", name);
                        None
                    }
                };
                StartSide {
                    name: Some(name.clone()),
                    weather,
                }
            }
            None => {
                let coord = self.geo.current_device_location().await;
                debug!("No start location given, using device location {}", coord);
                let (name, weather) =
                    tokio::join!(self.geo.reverse(coord), self.weather_unless_sentinel(coord));
                StartSide {
                    name: Some(name),
                    weather,
                }
            }
        }
    }

    async fn weather_unless_sentinel(&self, coord: Coordinate) -> Option<WeatherSummary> {
        if coord.is_sentinel() {
            warn!("Device location unresolved, skipping start weather");
            return None;
        }
        Some(self.weather.summarize(coord).await)
    }

    async fn resolve_destination(&self, query: &TravelQuery) -> Option<DestinationSide> {
        let name = query.destination.as_ref()?;
        let Some(coord) = self.geo.forward(name).await else {
            warn!("Destination '{}' not found, leaving it out", name);
            return None;
        };

        Some(DestinationSide {
            name: name.clone(),
            weather: self.weather.summarize(coord).await,
        })
    }
}
