//! Plain-text rendering of assistant replies

use crate::error::OrchestrationError;
use crate::models::TravelResponse;
use crate::orchestrator::AssistantReply;

pub const NO_RESULTS_MESSAGE: &str = "No results found, please check your input.";

/// Labeled lines for every resolved field; unset fields are omitted
#[must_use]
pub fn render_response(response: &TravelResponse) -> String {
    if response.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let fields = [
        ("Start location", response.start_location.as_deref()),
        (
            "Start weather",
            response.start_weather.as_ref().map(|w| w.text.as_str()),
        ),
        ("Destination", response.destination.as_deref()),
        (
            "Destination weather",
            response.destination_weather.as_ref().map(|w| w.text.as_str()),
        ),
    ];

    fields
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn render_reply(reply: &AssistantReply) -> String {
    match reply {
        AssistantReply::Structured(response) => render_response(response),
        AssistantReply::Composed(text) if text.trim().is_empty() => NO_RESULTS_MESSAGE.to_string(),
        AssistantReply::Composed(text) => text.clone(),
    }
}

#[must_use]
pub fn render_error(error: &OrchestrationError) -> String {
    error.user_message()
}
