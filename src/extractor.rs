//! Structured extraction of travel queries
//!
//! Two ways to use the model:
//! - [`StructuredExtractor::extract`] binds the reply to the `TravelQuery`
//!   schema, guided by per-field descriptions.
//! - [`StructuredExtractor::compose_with_tools`] hands the model the lookup
//!   tools and returns its final composed reply.

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::ExtractionError;
use crate::llm::{ChatMessage, LanguageModel, ModelRequest, ResponseSchema, ToolRegistry};
use crate::models::TravelQuery;

/// Field guide for `startLocation`. Extraction quality depends on this wording.
pub const START_LOCATION_GUIDE: &str = "The name of the departure or starting location currently entered by the user; leave empty if not specified.";

/// Field guide for `destination`. Extraction quality depends on this wording.
pub const DESTINATION_GUIDE: &str =
    "The name of the destination the user wants to go to; leave empty if not specified.";

const EXTRACTION_INSTRUCTIONS: &str = "You extract travel plans from user requests. \
Fill in the departure and destination fields of the TravelQuery object from the user's text. \
Reply with the JSON object only.";

const TOOL_CALLING_INSTRUCTIONS: &str = "You are a travel assistant with two tools. \
Always resolve the start location first with resolveLocation; if the user did not name a departure point, \
call it with an empty name to get the user's current location. Then call getWeather with the start coordinate. \
Only if the user mentioned a destination, resolve the destination with resolveLocation and call getWeather with its coordinate. \
Finally reply with a single paragraph that states the start location, the weather there, \
the destination and the weather there. Leave out the destination if none was mentioned, \
and say so plainly when a location or its weather could not be found.";

/// JSON schema the model's reply is bound to in direct-schema mode
#[must_use]
pub fn travel_query_schema() -> ResponseSchema {
    ResponseSchema {
        name: "TravelQuery".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "startLocation": {
                    "type": ["string", "null"],
                    "description": START_LOCATION_GUIDE,
                },
                "destination": {
                    "type": ["string", "null"],
                    "description": DESTINATION_GUIDE,
                },
            },
            "additionalProperties": false,
        }),
    }
}

/// Turns free text into a [`TravelQuery`] or a tool-driven reply
pub struct StructuredExtractor {
    model: Arc<dyn LanguageModel>,
    max_tool_rounds: usize,
}

impl StructuredExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, max_tool_rounds: usize) -> Self {
        Self {
            model,
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    /// Direct-schema mode
    #[instrument(skip(self))]
    pub async fn extract(&self, text: &str) -> Result<TravelQuery, ExtractionError> {
        let request = ModelRequest {
            messages: vec![
                ChatMessage::system(EXTRACTION_INSTRUCTIONS),
                ChatMessage::user(text),
            ],
            schema: Some(travel_query_schema()),
            tools: Vec::new(),
        };

        let response = self.model.respond(&request).await?;
        let query = parse_travel_query(&response.content)?;
        info!(
            start = ?query.start_location,
            destination = ?query.destination,
            "Extracted travel query"
        );
        Ok(query)
    }

    /// Tool-calling mode: the model sequences the lookups itself
    #[instrument(skip(self, tools))]
    pub async fn compose_with_tools(
        &self,
        text: &str,
        tools: &ToolRegistry,
    ) -> Result<String, ExtractionError> {
        let mut request = ModelRequest {
            messages: vec![
                ChatMessage::system(TOOL_CALLING_INSTRUCTIONS),
                ChatMessage::user(text),
            ],
            schema: None,
            tools: tools.definitions(),
        };

        for round in 1..=self.max_tool_rounds {
            let response = self.model.respond(&request).await?;

            if !response.has_tool_calls() {
                let reply = response.content.trim();
                if reply.is_empty() {
                    return Err(ExtractionError::EmptyReply);
                }
                debug!(round, "Model composed final reply");
                return Ok(response.content);
            }

            debug!(round, calls = response.tool_calls.len(), "Model requested tools");
            request.messages.push(ChatMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let output = tools.invoke(call).await;
                request
                    .messages
                    .push(ChatMessage::tool_result(call.id.clone(), output.to_string()));
            }
        }

        warn!("Tool calling exceeded {} rounds", self.max_tool_rounds);
        Err(ExtractionError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}

/// Parse model output into a query, tolerating Markdown code fences
pub fn parse_travel_query(content: &str) -> Result<TravelQuery, ExtractionError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyReply);
    }

    let json = strip_code_fence(trimmed);
    let value: Value =
        serde_json::from_str(json).map_err(|e| ExtractionError::Unparsable(e.to_string()))?;
    if !value.is_object() {
        return Err(ExtractionError::Unparsable(format!(
            "expected a JSON object, got {value}"
        )));
    }

    serde_json::from_value(value).map_err(|e| ExtractionError::Unparsable(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
