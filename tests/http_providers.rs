//! HTTP providers against an in-process server

mod common;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;

use common::{client, spawn_server};
use travel_assistant::error::{GeocodeFailure, WeatherFailure};
use travel_assistant::geo::{Geocoder, NominatimGeocoder};
use travel_assistant::models::Coordinate;
use travel_assistant::weather::{OpenMeteoWeather, OpenWeatherMap, WeatherProvider};

const TAIPEI_101: Coordinate = Coordinate {
    latitude: 25.0336,
    longitude: 121.5648,
};

async fn openweathermap_handler(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("appid").map(String::as_str) != Some("secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"cod": 401, "message": "Invalid API key"})),
        );
    }
    assert_eq!(params.get("units").map(String::as_str), Some("metric"));
    (
        StatusCode::OK,
        Json(json!({
            "name": "Taipei",
            "main": {"temp": 30.6, "feels_like": 35.0, "humidity": 70},
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
        })),
    )
}

async fn openweathermap(api_key: Option<&str>) -> OpenWeatherMap {
    let base_url = spawn_server(Router::new().route("/weather", get(openweathermap_handler))).await;
    OpenWeatherMap::with_client(client(), base_url, api_key.map(str::to_string), "en".into())
}

#[tokio::test]
async fn test_openweathermap_success() {
    let provider = openweathermap(Some("secret")).await;
    let summary = provider.current_summary(TAIPEI_101).await.unwrap();
    assert_eq!(
        summary,
        "Taipei - Temperature: 31°C, Condition: broken clouds, Humidity: 70%"
    );
}

#[tokio::test]
async fn test_openweathermap_rejected_key_is_status_failure() {
    let provider = openweathermap(Some("wrong")).await;
    let err = provider.current_summary(TAIPEI_101).await.unwrap_err();
    assert!(matches!(err, WeatherFailure::Status(401)));
}

#[tokio::test]
async fn test_openweathermap_without_key_is_not_configured() {
    let provider = openweathermap(None).await;
    let err = provider.current_summary(TAIPEI_101).await.unwrap_err();
    assert!(matches!(err, WeatherFailure::NotConfigured(_)));
}

#[tokio::test]
async fn test_open_meteo_current_conditions() {
    let app = Router::new().route(
        "/forecast",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(
                params.get("current").map(String::as_str),
                Some("temperature_2m,weather_code")
            );
            Json(json!({"current": {"temperature_2m": 24.06, "weather_code": 3}}))
        }),
    );
    let provider = OpenMeteoWeather::with_client(client(), spawn_server(app).await);

    let summary = provider.current_summary(TAIPEI_101).await.unwrap();
    assert_eq!(summary, "Temperature: 24.1°C, Condition: Overcast");
}

#[tokio::test]
async fn test_open_meteo_missing_current_block() {
    let app = Router::new().route("/forecast", get(|| async { Json(json!({})) }));
    let provider = OpenMeteoWeather::with_client(client(), spawn_server(app).await);

    let err = provider.current_summary(TAIPEI_101).await.unwrap_err();
    assert!(matches!(err, WeatherFailure::Decode(_)));
}

fn nominatim_app() -> Router {
    Router::new()
        .route(
            "/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("q").map(String::as_str) {
                    Some("Taipei 101") => Json(json!([{
                        "lat": "25.0336",
                        "lon": "121.5648",
                        "display_name": "Taipei 101, Xinyi District, Taipei",
                    }])),
                    _ => Json(json!([])),
                }
            }),
        )
        .route(
            "/reverse",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("lat").map(String::as_str) == Some("25.0336") {
                    Json(json!({"name": "Taipei 101", "display_name": "Taipei 101, Xinyi District"}))
                } else {
                    Json(json!({"error": "Unable to geocode"}))
                }
            }),
        )
}

#[tokio::test]
async fn test_nominatim_forward_and_reverse() {
    let geocoder = NominatimGeocoder::with_client(client(), spawn_server(nominatim_app()).await, "en".into());

    let coord = geocoder.forward("Taipei 101").await.unwrap();
    assert_eq!(coord, TAIPEI_101);
    assert_eq!(geocoder.reverse(coord).await.unwrap(), "Taipei 101");
}

#[tokio::test]
async fn test_nominatim_failures() {
    let geocoder = NominatimGeocoder::with_client(client(), spawn_server(nominatim_app()).await, "en".into());

    assert!(matches!(
        geocoder.forward("Atlantis").await,
        Err(GeocodeFailure::NoMatch(_))
    ));
    assert!(geocoder.reverse(Coordinate::new(-60.0, 10.0)).await.is_err());
}
