//! End-to-end travel query scenarios with in-memory providers

use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use travel_assistant::config::ExtractionMode;
use travel_assistant::error::{GeocodeFailure, LlmError, WeatherFailure};
use travel_assistant::extractor::StructuredExtractor;
use travel_assistant::geo::{DeviceLocator, GeoResolver, Geocoder, StaticLocationSource};
use travel_assistant::llm::{LanguageModel, ModelRequest, ModelResponse, Role, ToolCall};
use travel_assistant::models::{Coordinate, ProviderTier};
use travel_assistant::orchestrator::{AssistantReply, QueryOrchestrator};
use travel_assistant::presentation;
use travel_assistant::weather::{SyntheticWeather, WeatherProvider, WeatherResolver};

/// Replays canned replies and records every request it saw
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<Vec<Result<ModelResponse, LlmError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<ModelResponse, LlmError>>) -> Arc<Self> {
        let mut replies = replies;
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn respond(&self, request: &ModelRequest) -> Result<ModelResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(LlmError::Http("no scripted reply left".into())))
    }
}

struct Gazetteer {
    places: HashMap<&'static str, Coordinate>,
}

impl Gazetteer {
    fn taipei() -> Arc<Self> {
        Arc::new(Self {
            places: HashMap::from([
                ("Taipei 101", Coordinate::new(25.0336, 121.5648)),
                ("Banqiao", Coordinate::new(25.0143, 121.4672)),
            ]),
        })
    }
}

#[async_trait]
impl Geocoder for Gazetteer {
    async fn forward(&self, place_name: &str) -> Result<Coordinate, GeocodeFailure> {
        self.places
            .get(place_name)
            .copied()
            .ok_or_else(|| GeocodeFailure::NoMatch(place_name.to_string()))
    }

    async fn reverse(&self, coord: Coordinate) -> Result<String, GeocodeFailure> {
        self.places
            .iter()
            .find(|(_, c)| **c == coord)
            .map(|(name, _)| (*name).to_string())
            .ok_or_else(|| GeocodeFailure::NoMatch(coord.format_coordinates()))
    }
}

/// Weather provider that counts calls and records every coordinate
struct RecordingWeather {
    result: Result<String, WeatherFailure>,
    seen: Mutex<Vec<Coordinate>>,
    calls: AtomicUsize,
}

impl RecordingWeather {
    fn new(result: Result<String, WeatherFailure>) -> Arc<Self> {
        Arc::new(Self {
            result,
            seen: Mutex::default(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl WeatherProvider for RecordingWeather {
    fn name(&self) -> &str {
        "recording"
    }

    async fn current_summary(&self, coord: Coordinate) -> Result<String, WeatherFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(coord);
        self.result.clone()
    }
}

struct Fixture {
    model: Arc<ScriptedModel>,
    primary: Arc<RecordingWeather>,
    orchestrator: QueryOrchestrator,
}

fn fixture(
    replies: Vec<Result<ModelResponse, LlmError>>,
    device: Option<Coordinate>,
    primary: Result<String, WeatherFailure>,
    secondary: Option<Result<String, WeatherFailure>>,
    mode: ExtractionMode,
) -> Fixture {
    let model = ScriptedModel::new(replies);
    let primary = RecordingWeather::new(primary);
    let secondary = secondary.map(|r| RecordingWeather::new(r) as Arc<dyn WeatherProvider>);

    let geo = Arc::new(GeoResolver::new(
        Gazetteer::taipei(),
        DeviceLocator::new(
            Arc::new(StaticLocationSource::new(device)),
            Duration::from_secs(10),
        ),
    ));
    let weather = Arc::new(WeatherResolver::new(
        Some(Arc::clone(&primary) as Arc<dyn WeatherProvider>),
        secondary,
        SyntheticWeather::new(Duration::ZERO),
        Duration::from_secs(5),
    ));
    let extractor = StructuredExtractor::new(Arc::clone(&model) as Arc<dyn LanguageModel>, 6);

    Fixture {
        model,
        primary,
        orchestrator: QueryOrchestrator::new(extractor, geo, weather, mode),
    }
}

fn extracted(json: &str) -> Vec<Result<ModelResponse, LlmError>> {
    vec![Ok(ModelResponse::text(json))]
}

#[tokio::test]
async fn test_destination_only_with_location_permission_denied() {
    let f = fixture(
        extracted(r#"{"startLocation": null, "destination": "Taipei 101"}"#),
        None,
        Ok("Temperature: 27.3°C, Condition: Mainly clear".into()),
        None,
        ExtractionMode::Structured,
    );

    let response = f
        .orchestrator
        .process_travel_query("I want to go to Taipei 101")
        .await
        .unwrap();

    assert_eq!(response.start_location.as_deref(), Some("unknown location"));
    assert!(response.start_weather.is_none());
    assert_eq!(response.destination.as_deref(), Some("Taipei 101"));
    assert_eq!(
        response.destination_weather.unwrap().text,
        "Temperature: 27.3°C, Condition: Mainly clear"
    );

    // The sentinel never reached a weather provider
    let seen = f.primary.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![Coordinate::new(25.0336, 121.5648)]);
}

#[tokio::test]
async fn test_no_start_no_destination_uses_device_location() {
    let f = fixture(
        extracted(r#"{"startLocation": "", "destination": ""}"#),
        Some(Coordinate::new(25.0143, 121.4672)),
        Ok("Temperature: 22.0°C, Condition: Overcast".into()),
        None,
        ExtractionMode::Structured,
    );

    let response = f.orchestrator.process_travel_query("how is the weather").await.unwrap();

    assert_eq!(response.start_location.as_deref(), Some("Banqiao"));
    assert_eq!(
        response.start_weather.unwrap().text,
        "Temperature: 22.0°C, Condition: Overcast"
    );
    assert!(response.destination.is_none());
    assert!(response.destination_weather.is_none());
}

#[tokio::test]
async fn test_weather_falls_back_to_secondary() {
    let f = fixture(
        extracted(r#"{"startLocation": "Banqiao", "destination": "Taipei 101"}"#),
        None,
        Err(WeatherFailure::Status(503)),
        Some(Ok("Taipei - Temperature: 31°C, Condition: broken clouds, Humidity: 70%".into())),
        ExtractionMode::Structured,
    );

    let response = f
        .orchestrator
        .process_travel_query("Banqiao to Taipei 101")
        .await
        .unwrap();

    assert_eq!(response.start_weather.unwrap().tier, ProviderTier::Secondary);
    assert_eq!(response.destination_weather.unwrap().tier, ProviderTier::Secondary);
    assert_eq!(f.primary.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_all_weather_tiers_down_gives_synthetic_summary() {
    let f = fixture(
        extracted(r#"{"destination": "Taipei 101"}"#),
        None,
        Err(WeatherFailure::Network("connection refused".into())),
        Some(Err(WeatherFailure::Status(500))),
        ExtractionMode::Structured,
    );

    let response = f.orchestrator.process_travel_query("Taipei 101").await.unwrap();
    let weather = response.destination_weather.unwrap();

    assert!(weather.is_synthetic());
    assert!(weather.text.starts_with("Simulated data - Temperature: "));
}

#[rstest]
#[case(Err(LlmError::Timeout(30)))]
#[case(Ok(ModelResponse::text("Sorry, I can't help with that.")))]
#[case(Ok(ModelResponse::text("")))]
#[tokio::test]
async fn test_extraction_failure_surfaces_as_query_failed(
    #[case] reply: Result<ModelResponse, LlmError>,
) {
    let f = fixture(
        vec![reply],
        None,
        Ok("unused".into()),
        None,
        ExtractionMode::Structured,
    );

    let err = f.orchestrator.answer("I want to go to Taipei 101").await.unwrap_err();

    assert!(presentation::render_error(&err).starts_with("Query failed: "));
    assert_eq!(f.primary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unresolvable_names_render_no_results_only_when_nothing_resolved() {
    let f = fixture(
        extracted(r#"{"destination": "Atlantis"}"#),
        None,
        Ok("unused".into()),
        None,
        ExtractionMode::Structured,
    );

    let reply = f.orchestrator.answer("take me to Atlantis").await.unwrap();
    // The start side still degrades to "unknown location"
    let AssistantReply::Structured(response) = &reply else {
        panic!("expected a structured reply");
    };
    assert!(response.destination.is_none());
    assert_eq!(
        presentation::render_reply(&reply),
        "Start location: unknown location"
    );
}

#[tokio::test]
async fn test_extraction_request_is_schema_bound() {
    let f = fixture(
        extracted(r#"{"destination": "Taipei 101"}"#),
        None,
        Ok("Temperature: 27.3°C, Condition: Mainly clear".into()),
        None,
        ExtractionMode::Structured,
    );

    f.orchestrator.process_travel_query("I want to go to Taipei 101").await.unwrap();

    let requests = f.model.requests();
    assert_eq!(requests.len(), 1);
    let schema = requests[0].schema.as_ref().unwrap();
    assert_eq!(schema.name, "TravelQuery");
    assert!(requests[0].tools.is_empty());
    assert_eq!(requests[0].messages.last().unwrap().content, "I want to go to Taipei 101");
}

#[tokio::test]
async fn test_tool_calling_mode_drives_lookups_and_returns_text_unmodified() {
    let final_text = "You are near Banqiao where it is overcast at 22°C; Taipei 101 is mainly clear.";
    let replies = vec![
        Ok(ModelResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_start".into(),
                name: "resolveLocation".into(),
                arguments: json!({"name": ""}),
            }],
        }),
        Ok(ModelResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_weather".into(),
                name: "getWeather".into(),
                arguments: json!({"latitude": 25.0143, "longitude": 121.4672}),
            }],
        }),
        Ok(ModelResponse::text(final_text)),
    ];
    let f = fixture(
        replies,
        Some(Coordinate::new(25.0143, 121.4672)),
        Ok("Temperature: 22.0°C, Condition: Overcast".into()),
        None,
        ExtractionMode::ToolCalling,
    );

    let reply = f.orchestrator.answer("what's it like here and at Taipei 101").await.unwrap();
    assert_eq!(reply, AssistantReply::Composed(final_text.to_string()));

    let requests = f.model.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tools.len(), 2);
    assert!(requests[0].schema.is_none());

    let last = &requests[2].messages;
    let tool_outputs: Vec<_> = last.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_outputs.len(), 2);
    assert!(tool_outputs[0].content.contains("Banqiao"));
    assert!(tool_outputs[1].content.contains("Overcast"));
}

#[tokio::test]
async fn test_tool_calling_round_limit() {
    let looping = || {
        Ok(ModelResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call".into(),
                name: "resolveLocation".into(),
                arguments: json!({"name": "Taipei 101"}),
            }],
        })
    };
    let f = fixture(
        (0..6).map(|_| looping()).collect(),
        None,
        Ok("unused".into()),
        None,
        ExtractionMode::ToolCalling,
    );

    let err = f.orchestrator.compose_travel_reply("loop forever").await.unwrap_err();
    assert!(err.to_string().contains("6 rounds"));
}
