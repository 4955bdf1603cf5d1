use crate::handlers::{health, scoring, ws};
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let scoring_routes = Router::new()
        .route("/update", post(scoring::ingest))
        .route("/scoreboard/{match_id}", get(scoring::get_scoreboard))
        .route("/test-mapping", post(scoring::test_mapping));

    let cors = cors_layer(state.config.cors_origins.as_deref());

    Router::new()
        .nest("/scoring", scoring_routes)
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
