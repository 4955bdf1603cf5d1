use chrono::{DateTime, Utc};
use serde::Serialize;
use types::ids::MatchId;
use types::score::CanonicalScoreUpdate;
use types::scoreboard::{ScoreboardProjection, ScoreboardView};

/// Soft-fail body. Scoring faults are reported with HTTP 200.
#[derive(Debug, Clone, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl FailureResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: None,
        }
    }

    pub fn stamped(error: impl Into<String>) -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::new(error)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub match_id: MatchId,
    pub updated_at: DateTime<Utc>,
    pub scoreboard_data: ScoreboardProjection,
}

#[derive(Debug, Serialize)]
pub struct ScoreboardResponse<'a> {
    pub success: bool,
    pub data: ScoreboardView<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingPreviewResponse {
    pub success: bool,
    pub mapped_score_update: CanonicalScoreUpdate,
    pub scoreboard_data: ScoreboardProjection,
    pub original_data_size: usize,
    pub simplified_data_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub matches: usize,
    pub clients: usize,
}
