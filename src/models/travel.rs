//! Travel query and response models

use serde::{Deserialize, Deserializer, Serialize};

use super::WeatherSummary;

/// Start and destination extracted from the user's free text
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TravelQuery {
    #[serde(default, deserialize_with = "non_empty")]
    pub start_location: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub destination: Option<String>,
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(normalize(value))
}

/// Everything resolved for one request; any field may be absent
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TravelResponse {
    pub start_location: Option<String>,
    pub start_weather: Option<WeatherSummary>,
    pub destination: Option<String>,
    pub destination_weather: Option<WeatherSummary>,
}

impl TravelResponse {
    /// True when nothing at all was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_location.is_none()
            && self.start_weather.is_none()
            && self.destination.is_none()
            && self.destination_weather.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"startLocation": "Taipei Main Station", "destination": "Taipei 101"}"#, Some("Taipei Main Station"), Some("Taipei 101"))]
    #[case(r#"{"startLocation": "", "destination": "Taipei 101"}"#, None, Some("Taipei 101"))]
    #[case(r#"{"destination": "  "}"#, None, None)]
    #[case(r#"{"startLocation": null, "destination": null}"#, None, None)]
    #[case(r#"{}"#, None, None)]
    fn test_query_normalizes_empty_fields(
        #[case] json: &str,
        #[case] start: Option<&str>,
        #[case] destination: Option<&str>,
    ) {
        let query: TravelQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.start_location.as_deref(), start);
        assert_eq!(query.destination.as_deref(), destination);
    }

    #[test]
    fn test_empty_response() {
        assert!(TravelResponse::default().is_empty());
        let response = TravelResponse {
            destination: Some("Taipei 101".to_string()),
            ..Default::default()
        };
        assert!(!response.is_empty());
    }
}
