//! Display projection and stored snapshot
//!
//! The projection is what scoreboards render and what the real-time channel
//! pushes; the snapshot is the store's record of the latest projection for a
//! match together with the payload it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MatchId;
use crate::score::{MatchStatus, RawPayload, SetScore};

/// Display-oriented view of a match derived from the canonical update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardProjection {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub side1_player: String,
    pub side2_player: String,
    pub side1_points: String,
    pub side2_points: String,
    pub sets: Vec<SetScore>,
    pub serving_side: u32,
    pub serving_player: u32,
    /// Match format exactly as the feed describes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    pub last_update: DateTime<Utc>,
}

/// Latest accepted state of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardSnapshot {
    pub match_id: MatchId,
    pub projection: ScoreboardProjection,
    pub raw: RawPayload,
    pub last_update: DateTime<Utc>,
}

/// Retrieval view: the projection fields plus the retained raw payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardView<'a> {
    #[serde(flatten)]
    pub projection: &'a ScoreboardProjection,
    pub raw_data: &'a RawPayload,
}

impl ScoreboardSnapshot {
    pub fn view(&self) -> ScoreboardView<'_> {
        ScoreboardView {
            projection: &self.projection,
            raw_data: &self.raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn projection() -> ScoreboardProjection {
        ScoreboardProjection {
            match_id: MatchId::new("m1").unwrap(),
            status: MatchStatus::InProgress,
            side1_player: "John Doe".to_string(),
            side2_player: "Jane Smith".to_string(),
            side1_points: "30".to_string(),
            side2_points: "15".to_string(),
            sets: vec![],
            serving_side: 1,
            serving_player: 1,
            format: None,
            court: Some("centre".to_string()),
            start_time: None,
            last_update: Utc.with_ymd_and_hms(2025, 1, 16, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_projection_wire_names() {
        let json = serde_json::to_value(projection()).unwrap();
        assert_eq!(json["matchId"], "m1");
        assert_eq!(json["side1Player"], "John Doe");
        assert_eq!(json["side1Points"], "30");
        assert_eq!(json["status"], "IN_PROGRESS");
        assert_eq!(json["servingSide"], 1);
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_view_flattens_projection() {
        let p = projection();
        let snapshot = ScoreboardSnapshot {
            match_id: p.match_id.clone(),
            last_update: p.last_update,
            projection: p,
            raw: json!({"data": {"matchId": "m1"}}),
        };
        let json = serde_json::to_value(snapshot.view()).unwrap();
        assert_eq!(json["side2Player"], "Jane Smith");
        assert_eq!(json["rawData"]["data"]["matchId"], "m1");
        assert!(json.get("projection").is_none());
    }
}
