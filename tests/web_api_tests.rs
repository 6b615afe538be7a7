//! Integration tests for the web API.
//!
//! These tests drive the axum router end to end over mock hardware.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use train_pulse::hal::{MockHardware, SignalTrace};
use train_pulse::services::{build_router, MotorBackend, RequestRouter, SharedRegistry, WebServerConfig};
use train_pulse::{Config, MotorState};

type Shared = Arc<SharedRegistry<MockHardware>>;

fn create_test_app() -> (axum::Router, Shared) {
    let hardware = MockHardware::new(SignalTrace::disabled());
    let shared = Arc::new(SharedRegistry::from_config(&Config::default(), hardware).unwrap());
    let router = Arc::new(RequestRouter::new(Arc::clone(&shared)));
    let app = build_router(router, &WebServerConfig::default());
    (app, shared)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_lists_default_fleet() {
    let (app, _shared) = create_test_app();

    let (status, json) = get(app, "/status").await;
    assert_eq!(status, StatusCode::OK);

    let states: Vec<MotorState> = serde_json::from_value(json).unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].name.as_str(), "TestTrain");
    assert_eq!(states[0].speed, 0);
    assert_eq!(states[0].freq, 500);
}

#[tokio::test]
async fn test_state_wire_format() {
    let (app, _shared) = create_test_app();

    let (_, json) = get(app, "/status").await;
    assert_eq!(json[0]["mode"], "direct_pulse");
    assert_eq!(json[0]["direction"], "stopped");
}

#[tokio::test]
async fn test_forward_default_speed() {
    let (app, shared) = create_test_app();

    let (status, json) = get(app, "/TestTrain/forward").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["speed"], 50);
    assert_eq!(json["direction"], "forward");

    assert_eq!(shared.status()[0].speed, 50);
}

#[tokio::test]
async fn test_unknown_motor_404() {
    let (app, _shared) = create_test_app();

    let (status, json) = get(app, "/Ghost/forward").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn test_add_bridge_motor_then_drive() {
    let (app, shared) = create_test_app();

    let (status, json) = get(app.clone(), "/add?name=Shunter&pwm=15&freq=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "bridge_pwm");
    assert_eq!(json["speed"], 0);

    let (status, json) = get(app.clone(), "/Shunter/forward?val=30").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["speed"], 30);

    let (_, json) = get(app, "/Shunter/inc").await;
    assert_eq!(json["speed"], 40);

    assert_eq!(shared.status().len(), 2);
}

#[tokio::test]
async fn test_add_direct_motor() {
    let (app, _shared) = create_test_app();

    let (status, json) = get(app, "/add?name=Loco&rx=21&freq=700").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "direct_pulse");
    assert_eq!(json["freq"], 700);
}

#[tokio::test]
async fn test_add_missing_params() {
    let (app, shared) = create_test_app();

    for uri in ["/add", "/add?name=X&freq=100", "/add?pwm=15&freq=100", "/add?name=X&pwm=15"] {
        let (status, json) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string());
    }
    assert_eq!(shared.status().len(), 1);
}

#[tokio::test]
async fn test_add_replaces_existing() {
    let (app, shared) = create_test_app();

    get(app.clone(), "/TestTrain/forward").await;
    // Same GPIO as before: the old motor's line is released first.
    let (status, json) = get(app, "/add?name=TestTrain&rx=4&freq=800").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["freq"], 800);
    assert_eq!(json["speed"], 0);

    let states = shared.status();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].freq, 800);
}

#[tokio::test]
async fn test_readd_bridge_on_same_pins() {
    let (app, shared) = create_test_app();

    let (status, _) = get(app.clone(), "/add?name=Shunter&pwm=15&freq=1000").await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = get(app.clone(), "/add?name=Shunter&pwm=15&freq=2000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["freq"], 2000);

    let (status, _) = get(app, "/Shunter/forward?val=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared.status().len(), 2);
}

#[tokio::test]
async fn test_bad_replacement_keeps_motor() {
    let (app, shared) = create_test_app();

    get(app.clone(), "/TestTrain/forward").await;
    let (status, _) = get(app, "/add?name=TestTrain&rx=4&freq=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let states = shared.status();
    assert_eq!(states[0].speed, 50);
    assert_eq!(states[0].freq, 500);
}

#[tokio::test]
async fn test_add_pin_conflict_500() {
    let (app, _shared) = create_test_app();

    // GPIO4 already drives TestTrain
    let (status, _) = get(app, "/add?name=Clash&rx=4&freq=500").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_speed_on_pulse_motor_400() {
    let (app, _shared) = create_test_app();

    let (status, json) = get(app, "/TestTrain/speed?val=40").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("set_speed"));
}

#[tokio::test]
async fn test_bad_value_400() {
    let (app, _shared) = create_test_app();

    let (status, _) = get(app, "/TestTrain/forward?val=fast").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_action_keeps_state() {
    let (app, _shared) = create_test_app();

    let (status, json) = get(app, "/TestTrain/warp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["speed"], 0);
}

#[tokio::test]
async fn test_encoded_name() {
    let (app, _shared) = create_test_app();

    get(app.clone(), "/add?name=Big%20Boy&rx=21&freq=500").await;
    let (status, json) = get(app, "/Big%20Boy/toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Big Boy");
    assert_eq!(json["speed"], 50);
}

#[tokio::test]
async fn test_plus_in_path_is_literal() {
    let (app, _shared) = create_test_app();

    // In a query `+` is a space; in the path it is not.
    get(app.clone(), "/add?name=Loco%2B1&rx=21&freq=500").await;
    let (status, json) = get(app, "/Loco+1/forward").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Loco+1");
}

#[tokio::test]
async fn test_bad_shape_400() {
    let (app, _shared) = create_test_app();

    let (status, _) = get(app, "/a/b/c").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_index_page() {
    let (app, _shared) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
}
