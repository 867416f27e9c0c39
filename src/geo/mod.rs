//! Place name <-> coordinate resolution
//!
//! `GeoResolver` never returns an error: failed forward lookups become
//! `None`, failed reverse lookups become [`UNKNOWN_LOCATION`] and a missing
//! device fix becomes [`Coordinate::SENTINEL`]. All lookups share one
//! [`GeocodingSession`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::AssistantConfig;
use crate::error::GeocodeFailure;
use crate::models::{Coordinate, UNKNOWN_LOCATION};

pub mod device;
pub mod nominatim;
pub mod session;

pub use device::{
    AuthorizationStatus, DeviceLocator, IpLocationSource, LocationDelegate, LocationSource,
    StaticLocationSource,
};
pub use nominatim::NominatimGeocoder;
pub use session::GeocodingSession;

/// External forward/reverse geocoding capability
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, place_name: &str) -> Result<Coordinate, GeocodeFailure>;

    async fn reverse(&self, coord: Coordinate) -> Result<String, GeocodeFailure>;
}

/// Geocoding plus device location, with failures absorbed
pub struct GeoResolver {
    geocoder: Arc<dyn Geocoder>,
    session: GeocodingSession,
    device: DeviceLocator,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, device: DeviceLocator) -> Self {
        Self {
            geocoder,
            session: GeocodingSession::new(),
            device,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(NominatimGeocoder::new(&config.geocoding)?),
            DeviceLocator::from_config(&config.location)?,
        ))
    }

    /// Coordinate for a place name, `None` when nothing usable was found
    #[instrument(skip(self))]
    pub async fn forward(&self, place_name: &str) -> Option<Coordinate> {
        let place_name = place_name.trim();
        if place_name.is_empty() {
            return None;
        }

        match self.session.run(self.geocoder.forward(place_name)).await {
            Ok(coord) if coord.is_sentinel() => {
                warn!("Geocoder returned the sentinel coordinate for '{}'", place_name);
                None
            }
            Ok(coord) => Some(coord),
            Err(e) => {
                warn!(error = %e, "Forward geocoding failed for '{}'", place_name);
                None
            }
        }
    }

    /// Best-effort place name for a coordinate
    #[instrument(skip(self), fields(coord = %coord))]
    pub async fn reverse(&self, coord: Coordinate) -> String {
        if coord.is_sentinel() {
            debug!("Skipping reverse geocode of the sentinel coordinate");
            return UNKNOWN_LOCATION.to_string();
        }

        match self.session.run(self.geocoder.reverse(coord)).await {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }

    /// Device coordinate, or the sentinel on denial, failure or timeout
    pub async fn current_device_location(&self) -> Coordinate {
        self.device.current_location().await
    }
}
