use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.scoring.stats();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        matches: stats.matches,
        clients: stats.clients,
    })
}
