//! Travel assistant - free-text travel queries answered with places and weather
//!
//! A language model extracts the start and destination from the user's text,
//! each side is geocoded and gets a current weather summary from a tiered
//! provider chain. The device location stands in when no start is given.

pub mod config;
pub mod error;
pub mod extractor;
pub mod geo;
pub mod http;
pub mod llm;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod presentation;
pub mod tools;
pub mod weather;

// Re-export core types for public API
pub use config::{AssistantConfig, ExtractionMode};
pub use error::{AssistantError, ExtractionError, OrchestrationError};
pub use extractor::StructuredExtractor;
pub use geo::{DeviceLocator, GeoResolver, Geocoder};
pub use llm::{LanguageModel, OpenAiChatModel};
pub use models::{Coordinate, TravelQuery, TravelResponse, WeatherSummary};
pub use orchestrator::{AssistantReply, QueryOrchestrator};
pub use weather::{WeatherProvider, WeatherResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
