//! Canonical score update types
//!
//! The schema-stable representation of a match's current score, independent
//! of the shape the upstream scoring feed happened to use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MatchId;

/// Opaque payload exactly as received from the scoring feed.
pub type RawPayload = serde_json::Value;

/// Point score shown before the first point of a game.
pub const DEFAULT_POINT_SCORE: &str = "0";

/// Set-by-set summary shown before any game has been played.
pub const DEFAULT_SCORE_STRING: &str = "0-0";

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Suspended,
}

impl MatchStatus {
    /// Map a feed status string to a status.
    ///
    /// Total and case-insensitive: unknown or absent strings are
    /// `NotStarted`.
    pub fn from_source(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return MatchStatus::NotStarted;
        };

        match raw.to_ascii_uppercase().as_str() {
            "IN_PROGRESS" | "LIVE_SCORE" => MatchStatus::InProgress,
            "COMPLETED" | "FINISHED" => MatchStatus::Completed,
            "SUSPENDED" => MatchStatus::Suspended,
            _ => MatchStatus::NotStarted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "NOT_STARTED",
            MatchStatus::InProgress => "IN_PROGRESS",
            MatchStatus::Completed => "COMPLETED",
            MatchStatus::Suspended => "SUSPENDED",
        }
    }
}

/// Current server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Serving side (1 or 2)
    pub side_number: u32,
    /// Serving player within the side (doubles)
    pub player_number: u32,
    pub player_id: String,
    /// `DEUCE` or `AD`
    pub returning_side: String,
}

impl ServerInfo {
    pub const DEFAULT_RETURNING_SIDE: &'static str = "DEUCE";
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            side_number: 1,
            player_number: 1,
            player_id: String::new(),
            returning_side: Self::DEFAULT_RETURNING_SIDE.to_string(),
        }
    }
}

/// Score of one set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub set_number: u32,
    /// Games won by side 1
    pub side1_score: u32,
    /// Games won by side 2
    pub side2_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side1_tiebreak_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side2_tiebreak_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_side: Option<u32>,
    pub is_completed: bool,
}

/// One player as listed by the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub player_number: u32,
}

impl PlayerEntry {
    pub const UNKNOWN_FIRST_NAME: &'static str = "Unknown";
    pub const UNKNOWN_LAST_NAME: &'static str = "Player";

    /// `"{first} {last}"` as shown on a scoreboard.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One side of the match (a single player or a doubles pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideRoster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_number: Option<u32>,
    pub players: Vec<PlayerEntry>,
}

impl SideRoster {
    /// Shown for a side the feed lists without any players.
    pub const UNKNOWN_PLAYER: &'static str = "Unknown Player";

    /// Scoreboard name for this side: its first listed player.
    pub fn display_name(&self) -> String {
        self.players
            .first()
            .map(PlayerEntry::display_name)
            .unwrap_or_else(|| Self::UNKNOWN_PLAYER.to_string())
    }
}

/// Normalized, schema-stable score update for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalScoreUpdate {
    pub match_id: MatchId,
    pub status: MatchStatus,
    /// Set-by-set summary for side 1, e.g. `6-1 2-6 4-1 (0-0)`
    pub score_string_side1: String,
    pub score_string_side2: String,
    /// Current game points (0, 15, 30, 40, AD)
    pub side1_point_score: String,
    pub side2_point_score: String,
    pub server: ServerInfo,
    /// Sets in feed order, never re-sorted
    pub sets: Vec<SetScore>,
    pub sides: Vec<SideRoster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_side: Option<u32>,
    /// When the update was normalized
    pub timestamp: DateTime<Utc>,
}
