use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use scoreboard_gateway::config::AppConfig;
use scoreboard_gateway::router::create_router;
use scoreboard_gateway::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "sk_test_key";

fn app() -> Router {
    let config = AppConfig {
        api_keys: vec![KEY.to_string()],
        ..AppConfig::default()
    };
    create_router(AppState::new(config))
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-api-key", KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", KEY))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn scenario_a() -> Value {
    json!({
        "data": {
            "matchId": "m1",
            "matchStatus": "IN_PROGRESS",
            "score": {
                "side1PointScore": "30",
                "side2PointScore": "15",
                "sets": [{"setNumber": 1, "side1Score": 6, "side2Score": 4, "isCompleted": true}]
            },
            "sides": [
                {"players": [{"participant": {"first_name": "John", "last_name": "Doe"}}]},
                {"players": [{"participant": {"first_name": "Jane", "last_name": "Smith"}}]}
            ]
        }
    })
}

#[tokio::test]
async fn test_missing_api_key() {
    let app = app();
    let request = Request::builder()
        .uri("/scoring/scoreboard/m1")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "API key is required");
}

#[tokio::test]
async fn test_invalid_api_key() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/scoring/update")
        .header("x-api-key", "sk_wrong")
        .body(Body::from(scenario_a().to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_ingest_then_retrieve() {
    let app = app();

    let (status, body) = send(&app, post("/scoring/update", scenario_a().to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["matchId"], "m1");
    assert_eq!(body["scoreboardData"]["side1Player"], "John Doe");
    let updated_at = body["updatedAt"].clone();

    let (status, body) = send(&app, get("/scoring/scoreboard/m1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["side2Player"], "Jane Smith");
    assert_eq!(data["side1Points"], "30");
    assert_eq!(data["status"], "IN_PROGRESS");
    assert_eq!(data["sets"][0]["isCompleted"], true);
    assert_eq!(data["lastUpdate"], updated_at);
    assert_eq!(data["rawData"], scenario_a());
}

#[tokio::test]
async fn test_missing_match_id_soft_fails() {
    let app = app();
    let payload = json!({"data": {"matchStatus": "IN_PROGRESS", "score": {}}});

    let (status, body) = send(&app, post("/scoring/update", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "error": "Match ID not found in scoring data"}));

    let (_, body) = send(&app, get("/scoring/scoreboard/m1")).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_non_json_body_soft_fails() {
    let app = app();
    let (status, body) = send(&app, post("/scoring/update", "not json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_match() {
    let app = app();
    let (status, body) = send(&app, get("/scoring/scoreboard/nope")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "No scoring data found for this match ID. Make sure scoring data has been sent to /scoring/update first."
        })
    );
}

#[tokio::test]
async fn test_mapping_preview_does_not_store() {
    let app = app();
    let (status, body) = send(&app, post("/scoring/test-mapping", scenario_a().to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["mappedScoreUpdate"]["matchId"], "m1");
    assert_eq!(body["scoreboardData"]["side1Player"], "John Doe");
    assert!(body["originalDataSize"].as_u64().unwrap() > 0);
    assert!(body["simplifiedDataSize"].as_u64().unwrap() > 0);

    let (_, body) = send(&app, get("/scoring/scoreboard/m1")).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    send(&app, post("/scoring/update", scenario_a().to_string())).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["matches"], 1);
    assert_eq!(body["clients"], 0);
}
