//! Ingest normalizer for the scoring feed
//!
//! Turns an arbitrary scoring payload into a [`CanonicalScoreUpdate`] and the
//! lighter [`ScoreboardProjection`] in a single pass. The function is pure:
//! the clock reading is passed in, so identical inputs give identical
//! outputs.
//!
//! Field precedence (first present, non-null candidate wins):
//!
//! | Field            | Candidates                                          | Default          |
//! |------------------|-----------------------------------------------------|------------------|
//! | match id         | `data.matchId`, `matchId`, `data._id`               | hard failure     |
//! | status           | `matchStatus` (case-insensitive aliases)            | `NOT_STARTED`    |
//! | point scores     | `score.side{1,2}PointScore`                         | `"0"`            |
//! | score strings    | `score.scoreStringSide{1,2}`                        | `"0-0"`          |
//! | server side      | `score.server.sideNumber`                           | `1`              |
//! | server player    | `score.server.playerNumber`                         | `1`              |
//! | server player id | `score.server.player`, `score.server.playerId`      | `""`             |
//! | returning side   | `score.server.returningSide`                        | `"DEUCE"`        |
//! | set number       | `setNumber`                                         | 1-based position |
//! | first name       | `participant.first_name`, `participant.firstName`   | `"Unknown"`      |
//! | last name        | `participant.last_name`, `participant.lastName`     | `"Player"`       |
//! | player id        | `participant._id`, `participant.id`, player `_id`   | none             |
//!
//! Everything except the match id lives in the match body, which is `data`
//! when that is an object and the payload itself otherwise.

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use types::errors::NormalizeError;
use types::ids::MatchId;
use types::score::{
    CanonicalScoreUpdate, MatchStatus, PlayerEntry, RawPayload, ServerInfo, SetScore, SideRoster,
    DEFAULT_POINT_SCORE, DEFAULT_SCORE_STRING,
};
use types::scoreboard::ScoreboardProjection;

/// A field location inside the raw payload, outermost key first.
pub type FieldPath = &'static [&'static str];

/// Candidate locations for the match identifier, highest precedence first.
pub const MATCH_ID_PRECEDENCE: &[FieldPath] = &[&["data", "matchId"], &["matchId"], &["data", "_id"]];

/// Both views produced by one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Full typed update
    pub update: CanonicalScoreUpdate,
    /// Display projection used for storage and broadcast
    pub projection: ScoreboardProjection,
}

/// Normalize a raw scoring payload.
///
/// Fails with [`NormalizeError::MissingMatchId`] when no candidate resolves
/// to a non-empty identifier, and with [`NormalizeError::MalformedInput`]
/// when `score` is not an object, `score.sets` is not an array, or a set
/// entry is `null`. Every other field falls back to its default.
pub fn normalize(raw: &RawPayload, received_at: DateTime<Utc>) -> Result<Normalized, NormalizeError> {
    let match_id = resolve_match_id(raw)?;

    let body = MatchBody::deserialize(match_body(raw))
        .map_err(|e| NormalizeError::MalformedInput(e.to_string()))?;

    let status = MatchStatus::from_source(body.match_status.as_ref().and_then(Value::as_str));
    let score = body.score.unwrap_or_default();
    let server = resolve_server(score.server);
    let sets = resolve_sets(score.sets.unwrap_or_default());
    let sides = resolve_sides(body.sides.unwrap_or_default());

    let side1_points = score
        .side1_point_score
        .unwrap_or_else(|| DEFAULT_POINT_SCORE.to_string());
    let side2_points = score
        .side2_point_score
        .unwrap_or_else(|| DEFAULT_POINT_SCORE.to_string());

    let projection = ScoreboardProjection {
        match_id: match_id.clone(),
        status,
        side1_player: side_display_name(&sides, 0),
        side2_player: side_display_name(&sides, 1),
        side1_points: side1_points.clone(),
        side2_points: side2_points.clone(),
        sets: sets.clone(),
        serving_side: server.side_number,
        serving_player: server.player_number,
        format: body.match_format,
        court: body.court_id,
        start_time: body.start_date,
        last_update: received_at,
    };

    let update = CanonicalScoreUpdate {
        match_id,
        status,
        score_string_side1: score
            .score_string_side1
            .unwrap_or_else(|| DEFAULT_SCORE_STRING.to_string()),
        score_string_side2: score
            .score_string_side2
            .unwrap_or_else(|| DEFAULT_SCORE_STRING.to_string()),
        side1_point_score: side1_points,
        side2_point_score: side2_points,
        server,
        sets,
        sides,
        winning_side: body.winning_side,
        timestamp: received_at,
    };

    Ok(Normalized { update, projection })
}

/// Resolve the match identifier through [`MATCH_ID_PRECEDENCE`].
///
/// String and numeric candidates are accepted; empty strings are skipped.
pub fn resolve_match_id(raw: &RawPayload) -> Result<MatchId, NormalizeError> {
    MATCH_ID_PRECEDENCE
        .iter()
        .filter_map(|path| lookup(raw, *path))
        .find_map(|candidate| match candidate {
            Value::String(s) => MatchId::new(s.as_str()).ok(),
            Value::Number(n) => MatchId::new(n.to_string()).ok(),
            _ => None,
        })
        .ok_or(NormalizeError::MissingMatchId)
}

fn lookup<'a>(raw: &'a Value, path: FieldPath) -> Option<&'a Value> {
    path.iter().try_fold(raw, |node, key| node.get(*key))
}

fn match_body(raw: &Value) -> &Value {
    match raw.get("data") {
        Some(data) if data.is_object() => data,
        _ => raw,
    }
}

fn resolve_server(server: Option<ServerBody>) -> ServerInfo {
    let Some(server) = server else {
        return ServerInfo::default();
    };
    let defaults = ServerInfo::default();

    ServerInfo {
        side_number: server.side_number.unwrap_or(defaults.side_number),
        player_number: server.player_number.unwrap_or(defaults.player_number),
        player_id: server.player.or(server.player_id).unwrap_or(defaults.player_id),
        returning_side: server.returning_side.unwrap_or(defaults.returning_side),
    }
}

fn resolve_sets(sets: Vec<SetBody>) -> Vec<SetScore> {
    sets.into_iter()
        .enumerate()
        .map(|(index, set)| SetScore {
            set_number: set.set_number.unwrap_or(index as u32 + 1),
            side1_score: set.side1_score.unwrap_or(0),
            side2_score: set.side2_score.unwrap_or(0),
            side1_tiebreak_score: set.side1_tiebreak_score,
            side2_tiebreak_score: set.side2_tiebreak_score,
            winning_side: set.winning_side,
            is_completed: set.is_completed.unwrap_or(false),
        })
        .collect()
}

fn resolve_sides(sides: Vec<SideBody>) -> Vec<SideRoster> {
    sides
        .into_iter()
        .map(|side| SideRoster {
            side_number: side.side_number,
            players: side
                .players
                .unwrap_or_default()
                .into_iter()
                .map(resolve_player)
                .collect(),
        })
        .collect()
}

fn resolve_player(player: PlayerBody) -> PlayerEntry {
    let participant = player.participant.unwrap_or_default();

    PlayerEntry {
        id: participant.underscore_id.or(participant.id).or(player.underscore_id),
        first_name: participant
            .first_name_snake
            .or(participant.first_name)
            .unwrap_or_else(|| PlayerEntry::UNKNOWN_FIRST_NAME.to_string()),
        last_name: participant
            .last_name_snake
            .or(participant.last_name)
            .unwrap_or_else(|| PlayerEntry::UNKNOWN_LAST_NAME.to_string()),
        player_number: player.player_number.unwrap_or(1),
    }
}

fn side_display_name(sides: &[SideRoster], index: usize) -> String {
    sides
        .get(index)
        .map(SideRoster::display_name)
        .unwrap_or_else(|| SideRoster::UNKNOWN_PLAYER.to_string())
}

// ---------------------------------------------------------------------------
// Input schema. Unknown fields are ignored, `null` reads as absent.
//
// Leaves are read leniently: a value of the wrong JSON type reads as absent
// and the documented default applies. Only `score` that is not an object,
// `score.sets` that is not an array, and a `null` set entry are malformed.
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MatchBody {
    /// Kept untyped so that a non-string status maps to `NOT_STARTED`
    match_status: Option<Value>,
    #[serde(deserialize_with = "lenient_u32")]
    winning_side: Option<u32>,
    match_format: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    court_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    start_date: Option<String>,
    score: Option<ScoreBody>,
    #[serde(deserialize_with = "lenient_entries")]
    sides: Option<Vec<SideBody>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScoreBody {
    #[serde(deserialize_with = "lenient_text")]
    score_string_side1: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    score_string_side2: Option<String>,
    #[serde(rename = "side1PointScore", deserialize_with = "lenient_text")]
    side1_point_score: Option<String>,
    #[serde(rename = "side2PointScore", deserialize_with = "lenient_text")]
    side2_point_score: Option<String>,
    #[serde(deserialize_with = "lenient")]
    server: Option<ServerBody>,
    #[serde(deserialize_with = "set_list")]
    sets: Option<Vec<SetBody>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ServerBody {
    #[serde(deserialize_with = "lenient_u32")]
    side_number: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    player_number: Option<u32>,
    #[serde(deserialize_with = "lenient_text")]
    player: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    player_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    returning_side: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetBody {
    #[serde(rename = "setNumber", deserialize_with = "lenient_u32")]
    set_number: Option<u32>,
    #[serde(rename = "side1Score", deserialize_with = "lenient_u32")]
    side1_score: Option<u32>,
    #[serde(rename = "side2Score", deserialize_with = "lenient_u32")]
    side2_score: Option<u32>,
    #[serde(rename = "side1TiebreakScore", deserialize_with = "lenient_u32")]
    side1_tiebreak_score: Option<u32>,
    #[serde(rename = "side2TiebreakScore", deserialize_with = "lenient_u32")]
    side2_tiebreak_score: Option<u32>,
    #[serde(rename = "winningSide", deserialize_with = "lenient_u32")]
    winning_side: Option<u32>,
    #[serde(rename = "isCompleted", deserialize_with = "lenient_bool")]
    is_completed: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SideBody {
    #[serde(deserialize_with = "lenient_u32")]
    side_number: Option<u32>,
    #[serde(deserialize_with = "lenient_entries")]
    players: Option<Vec<PlayerBody>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlayerBody {
    #[serde(deserialize_with = "lenient")]
    participant: Option<ParticipantBody>,
    #[serde(deserialize_with = "lenient_u32")]
    player_number: Option<u32>,
    #[serde(rename = "_id", deserialize_with = "lenient_text")]
    underscore_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParticipantBody {
    #[serde(rename = "_id", deserialize_with = "lenient_text")]
    underscore_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(rename = "first_name", deserialize_with = "lenient_text")]
    first_name_snake: Option<String>,
    #[serde(rename = "firstName", deserialize_with = "lenient_text")]
    first_name: Option<String>,
    #[serde(rename = "last_name", deserialize_with = "lenient_text")]
    last_name_snake: Option<String>,
    #[serde(rename = "lastName", deserialize_with = "lenient_text")]
    last_name: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.filter(|v| !v.is_null()))
}

/// Strings and numbers read as text; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present(deserializer)?.and_then(|value| match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// Non-negative integers, whole floats and numeric strings; anything else
/// is absent.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present(deserializer)?.and_then(|value| match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }))
}

/// Booleans, numbers (non-zero is true) and `"true"`/`"false"`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present(deserializer)?.and_then(|value| match value {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }))
}

/// A nested object; any value that does not fit reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(present(deserializer)?.and_then(|value| T::deserialize(value).ok()))
}

/// A list whose entries fall back to their defaults when they do not fit.
/// A non-array reads as absent.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(present(deserializer)?.and_then(|value| match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| T::deserialize(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    }))
}

/// `score.sets`: must be an array without `null` entries. Non-object
/// entries fall back to an empty set.
fn set_list<'de, D>(deserializer: D) -> Result<Option<Vec<SetBody>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = present(deserializer)? else {
        return Ok(None);
    };
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(de::Error::custom(format!(
                "score.sets: expected array, found {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Null => Err(de::Error::custom(format!("score.sets[{}] is null", index))),
            Value::Object(_) => SetBody::deserialize(item).map_err(de::Error::custom),
            _ => Ok(SetBody::default()),
        })
        .collect::<Result<Vec<_>, D::Error>>()
        .map(Some)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
