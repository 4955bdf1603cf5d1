use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use futures::{SinkExt, StreamExt};
use scoreboard_gateway::config::AppConfig;
use scoreboard_gateway::router::create_router;
use scoreboard_gateway::state::AppState;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const KEY: &str = "sk_test_key";

fn app() -> Router {
    let config = AppConfig {
        api_keys: vec![KEY.to_string()],
        ..AppConfig::default()
    };
    create_router(AppState::new(config))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    socket
}

/// Next JSON text frame, or `None` if nothing arrives within `wait`.
async fn next_event(socket: &mut Client, wait: Duration) -> Option<Value> {
    loop {
        match tokio::time::timeout(wait, socket.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => panic!("websocket error: {}", e),
            Ok(None) | Err(_) => return None,
        }
    }
}

async fn ingest(app: &Router, payload: Value) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/scoring/update")
        .header("x-api-key", KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    body_json(app, request).await
}

async fn health_clients(app: &Router) -> u64 {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    body_json(app, request).await["clients"].as_u64().unwrap()
}

async fn body_json(app: &Router, request: Request<Body>) -> Value {
    let response = app.clone().oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_join_ingest_and_close() {
    let app = app();
    let addr = serve(app.clone()).await;
    let mut socket = connect(addr).await;

    socket
        .send(Message::text(r#"{"event":"join_match","data":{"matchId":"m1"}}"#))
        .await
        .unwrap();
    let ack = next_event(&mut socket, WAIT).await.unwrap();
    assert_eq!(ack["event"], "joined_match");
    assert_eq!(ack["data"]["matchId"], "m1");
    assert_eq!(health_clients(&app).await, 1);

    let receipt = ingest(&app, json!({"matchId": "m1", "score": {"side1PointScore": "15"}})).await;
    assert_eq!(receipt["success"], true);

    let update = next_event(&mut socket, WAIT).await.unwrap();
    assert_eq!(update["event"], "score_update");
    assert_eq!(update["data"]["matchId"], "m1");
    assert_eq!(update["data"]["side1Points"], "15");
    assert!(next_event(&mut socket, QUIET).await.is_none());

    socket.close(None).await.unwrap();

    let mut clients = health_clients(&app).await;
    for _ in 0..100 {
        if clients == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        clients = health_clients(&app).await;
    }
    assert_eq!(clients, 0);
}

#[tokio::test]
async fn test_bad_frame_keeps_connection() {
    let app = app();
    let addr = serve(app.clone()).await;
    let mut socket = connect(addr).await;

    socket.send(Message::text("subscribe:live_scores")).await.unwrap();
    let error = next_event(&mut socket, WAIT).await.unwrap();
    assert_eq!(error["event"], "error");

    socket
        .send(Message::text(r#"{"event":"join_court","data":{"courtId":"centre"}}"#))
        .await
        .unwrap();
    let ack = next_event(&mut socket, WAIT).await.unwrap();
    assert_eq!(ack["event"], "joined_court");
}

#[tokio::test]
async fn test_unsubscribed_socket_gets_global_copy() {
    let app = app();
    let addr = serve(app.clone()).await;
    let mut watcher = connect(addr).await;

    // A frame round trip guarantees the socket is registered before ingest.
    watcher
        .send(Message::text(r#"{"event":"join_court","data":{"courtId":"1"}}"#))
        .await
        .unwrap();
    next_event(&mut watcher, WAIT).await.unwrap();

    ingest(&app, json!({"data": {"matchId": 42}})).await;

    let update = next_event(&mut watcher, WAIT).await.unwrap();
    assert_eq!(update["event"], "score_update");
    assert_eq!(update["data"]["matchId"], "42");
}
