//! Wire protocol for the real-time channel
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<name>", "data": {...}}`.
//!
//! Client -> server: `join_match`, `leave_match`, `join_court`.
//! Server -> client: `joined_match`, `joined_court`, `score_update`, `error`.

use std::fmt::Display;
use std::sync::Arc;

use serde::{de, Deserialize, Deserializer, Serialize};

use types::ids::{CourtId, MatchId};
use types::scoreboard::ScoreboardProjection;
use types::topic::Topic;

/// A serialized server event, shared between every recipient of a fanout.
pub type Frame = Arc<str>;

pub const JOINED_MATCH_MESSAGE: &str = "Joined match room. Waiting for scoring data...";
pub const JOINED_COURT_MESSAGE: &str = "Joined court room. Waiting for scoring data...";

/// Control message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinMatch {
        #[serde(rename = "matchId", deserialize_with = "text_or_number_id")]
        match_id: MatchId,
    },
    LeaveMatch {
        #[serde(rename = "matchId", deserialize_with = "text_or_number_id")]
        match_id: MatchId,
    },
    JoinCourt {
        #[serde(rename = "courtId", deserialize_with = "text_or_number_id")]
        court_id: CourtId,
    },
}

/// Ids arrive as strings or numbers; numbers are stringified as on ingest.
fn text_or_number_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<String>,
    T::Error: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    };
    T::try_from(raw).map_err(de::Error::custom)
}

impl ClientMessage {
    /// Topic the message refers to.
    pub fn topic(&self) -> Topic {
        match self {
            ClientMessage::JoinMatch { match_id } | ClientMessage::LeaveMatch { match_id } => {
                Topic::Match(match_id.clone())
            }
            ClientMessage::JoinCourt { court_id } => Topic::Court(court_id.clone()),
        }
    }
}

/// Event pushed to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges `join_match`; carries no score data.
    JoinedMatch {
        #[serde(rename = "matchId")]
        match_id: MatchId,
        message: String,
    },
    /// Acknowledges `join_court`; carries no score data.
    JoinedCourt {
        #[serde(rename = "courtId")]
        court_id: CourtId,
        message: String,
    },
    /// Latest projection for a match.
    ScoreUpdate(ScoreboardProjection),
    /// A frame from the client could not be handled.
    Error { message: String },
}

impl ServerEvent {
    pub fn joined_match(match_id: MatchId) -> Self {
        ServerEvent::JoinedMatch {
            match_id,
            message: JOINED_MATCH_MESSAGE.to_string(),
        }
    }

    pub fn joined_court(court_id: CourtId) -> Self {
        ServerEvent::JoinedCourt {
            court_id,
            message: JOINED_COURT_MESSAGE.to_string(),
        }
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::JoinedMatch { .. } => "joined_match",
            ServerEvent::JoinedCourt { .. } => "joined_court",
            ServerEvent::ScoreUpdate(_) => "score_update",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// Serialize once for delivery to any number of clients.
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}

/// Parse a raw text frame into a client message.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}
