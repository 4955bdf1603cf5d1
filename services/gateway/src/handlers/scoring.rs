use crate::auth::ApiKey;
use crate::models::{FailureResponse, IngestResponse, MappingPreviewResponse, ScoreboardResponse};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use scoring::ScoringError;
use types::errors::{NormalizeError, StoreError};
use types::score::RawPayload;

pub const NOT_FOUND_MESSAGE: &str =
    "No scoring data found for this match ID. Make sure scoring data has been sent to /scoring/update first.";

/// POST /scoring/update
///
/// The body is read as bytes so that a non-JSON body is answered with a
/// soft-fail body instead of axum's JSON rejection.
pub async fn ingest(State(state): State<AppState>, _key: ApiKey, body: Bytes) -> Response {
    let raw = match parse_body(&body) {
        Ok(raw) => raw,
        Err(failure) => return Json(failure).into_response(),
    };

    match state.scoring.ingest(raw) {
        Ok(receipt) => Json(IngestResponse {
            success: true,
            match_id: receipt.match_id,
            updated_at: receipt.updated_at,
            scoreboard_data: receipt.projection,
        })
        .into_response(),
        Err(ScoringError::Normalize(NormalizeError::MissingMatchId)) => {
            Json(FailureResponse::new(NormalizeError::MissingMatchId.to_string())).into_response()
        }
        Err(e) => Json(FailureResponse::stamped(e.to_string())).into_response(),
    }
}

/// GET /scoring/scoreboard/{matchId}
pub async fn get_scoreboard(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(match_id): Path<String>,
) -> Response {
    match state.scoring.scoreboard(&match_id) {
        Ok(snapshot) => Json(ScoreboardResponse {
            success: true,
            data: snapshot.view(),
        })
        .into_response(),
        Err(ScoringError::Store(StoreError::NotFound { .. })) => {
            Json(FailureResponse::new(NOT_FOUND_MESSAGE)).into_response()
        }
        Err(e) => Json(FailureResponse::stamped(e.to_string())).into_response(),
    }
}

/// POST /scoring/test-mapping
///
/// Maps a payload without storing or broadcasting it.
pub async fn test_mapping(State(state): State<AppState>, _key: ApiKey, body: Bytes) -> Response {
    let raw = match parse_body(&body) {
        Ok(raw) => raw,
        Err(failure) => return Json(failure).into_response(),
    };

    match state.scoring.preview(&raw) {
        Ok(preview) => Json(MappingPreviewResponse {
            success: true,
            mapped_score_update: preview.update,
            scoreboard_data: preview.projection,
            original_data_size: preview.original_size,
            simplified_data_size: preview.simplified_size,
        })
        .into_response(),
        Err(e) => Json(FailureResponse::new(e.to_string())).into_response(),
    }
}

fn parse_body(body: &[u8]) -> Result<RawPayload, FailureResponse> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Scoring payload is not valid JSON");
        FailureResponse::stamped(format!("Invalid JSON body: {}", e))
    })
}
