//! The lookup capabilities offered to the model in tool-calling mode

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::ToolError;
use crate::geo::GeoResolver;
use crate::llm::{Tool, ToolDefinition, ToolRegistry};
use crate::models::Coordinate;
use crate::weather::WeatherResolver;

pub const RESOLVE_LOCATION: &str = "resolveLocation";
pub const GET_WEATHER: &str = "getWeather";

/// `resolveLocation(name) -> coordinate`; a blank name means "where I am"
pub struct ResolveLocationTool {
    geo: Arc<GeoResolver>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolveLocationArgs {
    #[serde(default)]
    name: Option<String>,
}

impl ResolveLocationTool {
    pub fn new(geo: Arc<GeoResolver>) -> Self {
        Self { geo }
    }
}

#[async_trait]
impl Tool for ResolveLocationTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: RESOLVE_LOCATION.to_string(),
            description: "Look up current location (latitude/longitude) or a human-readable place name. Returns latitude longitude.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Place name to resolve; leave empty to use the user's current location.",
                    }
                },
            }),
            output_description: "Object with name, latitude, longitude and a resolved flag; coordinates are omitted when resolved is false.".to_string(),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ResolveLocationArgs = if arguments.is_null() {
            ResolveLocationArgs::default()
        } else {
            serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
                tool: RESOLVE_LOCATION.to_string(),
                message: e.to_string(),
            })?
        };

        let requested = args.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let (name, coord) = match requested {
            Some(name) => {
                let coord = self.geo.forward(&name).await;
                (name, coord)
            }
            None => {
                let coord = self.geo.current_device_location().await;
                let name = self.geo.reverse(coord).await;
                (name, coord.resolved())
            }
        };

        Ok(match coord {
            Some(coord) => json!({
                "name": name,
                "latitude": coord.latitude,
                "longitude": coord.longitude,
                "resolved": true,
            }),
            None => json!({
                "name": name,
                "resolved": false,
            }),
        })
    }
}

/// `getWeather(latitude, longitude) -> summary`
pub struct GetWeatherTool {
    weather: Arc<WeatherResolver>,
}

#[derive(Debug, Deserialize)]
struct GetWeatherArgs {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl GetWeatherTool {
    pub fn new(weather: Arc<WeatherResolver>) -> Self {
        Self { weather }
    }

    fn invalid(message: impl Into<String>) -> ToolError {
        ToolError::InvalidArguments {
            tool: GET_WEATHER.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: GET_WEATHER.to_string(),
            description: "Look up the current weather for a given coordinate (latitude/longitude). Returns a concise, structured summary.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "latitude": {
                        "type": "number",
                        "description": "Decimal latitude of the point, e.g. 25.0330.",
                    },
                    "longitude": {
                        "type": "number",
                        "description": "Decimal longitude of the point, e.g. 121.5654.",
                    },
                },
                "required": ["latitude", "longitude"],
            }),
            output_description: "Object with the weather summary text and the source that produced it.".to_string(),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetWeatherArgs =
            serde_json::from_value(arguments).map_err(|e| Self::invalid(e.to_string()))?;

        let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) else {
            return Err(Self::invalid("latitude and longitude are required"));
        };

        let coord = Coordinate::new(latitude, longitude);
        if !coord.is_in_range() {
            return Err(Self::invalid(format!("coordinate {coord} is out of range")));
        }
        if coord.is_sentinel() {
            return Err(ToolError::Failed {
                tool: GET_WEATHER.to_string(),
                message: "no weather for an unresolved location".to_string(),
            });
        }

        let summary = self.weather.summarize(coord).await;
        Ok(json!({
            "summary": summary.text,
            "source": summary.tier,
        }))
    }
}

/// Registry with both lookup tools
pub fn travel_tools(geo: Arc<GeoResolver>, weather: Arc<WeatherResolver>) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(ResolveLocationTool::new(geo)))
        .with(Arc::new(GetWeatherTool::new(weather)))
}
