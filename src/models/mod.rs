//! Data models for the travel assistant
//!
//! This module contains the request-scoped domain models organized by concern:
//! - Location: Geographic coordinates and the resolution-failed sentinel
//! - Weather: Formatted weather summaries tagged with the provider tier
//! - Travel: The extracted query and the assembled response

pub mod location;
pub mod travel;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, UNKNOWN_LOCATION};
pub use travel::{TravelQuery, TravelResponse};
pub use weather::{ProviderTier, WeatherSummary};
