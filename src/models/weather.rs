//! Weather summary model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which link of the weather fallback chain produced a summary
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    /// Native current-conditions provider
    Primary,
    /// Keyed HTTP weather API
    Secondary,
    /// Locally generated placeholder
    Synthetic,
}

impl ProviderTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTier::Primary => "primary",
            ProviderTier::Secondary => "secondary",
            ProviderTier::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable weather text plus the tier it came from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSummary {
    pub text: String,
    pub tier: ProviderTier,
}

impl WeatherSummary {
    #[must_use]
    pub fn new(text: impl Into<String>, tier: ProviderTier) -> Self {
        Self {
            text: text.into(),
            tier,
        }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.tier == ProviderTier::Synthetic
    }
}

impl fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
