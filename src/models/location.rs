//! Location model for geographic coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name used when a coordinate cannot be turned into a place name
pub const UNKNOWN_LOCATION: &str = "unknown location";

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// `(0, 0)` marks a failed resolution, never a real location.
    pub const SENTINEL: Coordinate = Coordinate {
        latitude: 0.0,
        longitude: 0.0,
    };

    /// Create a new coordinate
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this coordinate is the resolution-failed marker
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Whether latitude and longitude are inside their valid ranges
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Turn the sentinel into `None`
    #[must_use]
    pub fn resolved(self) -> Option<Self> {
        (!self.is_sentinel()).then_some(self)
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_coordinates())
    }
}
