//! Identifier types for scoreboard entities
//!
//! Match and court identifiers are issued by the upstream scoring
//! application and are opaque strings. Client identifiers are minted locally
//! with UUID v7 so connection logs sort chronologically.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

use crate::errors::IdError;

/// External match identifier from the scoring application
///
/// Never empty: an empty identifier is rejected at construction, which is
/// the only hard validation rule of the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    /// Create a MatchId, rejecting the empty string
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty { kind: "match" });
        }
        Ok(Self(id))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MatchId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}

impl Borrow<str> for MatchId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Court (venue) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourtId(String);

impl CourtId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty { kind: "court" });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CourtId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourtId> for String {
    fn from(id: CourtId) -> Self {
        id.0
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one real-time connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new ClientId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_rejects_empty() {
        assert!(MatchId::new("").is_err());
        assert_eq!(MatchId::new("m1").unwrap().as_str(), "m1");
    }

    #[test]
    fn test_match_id_serde_rejects_empty() {
        let ok: MatchId = serde_json::from_str("\"74794423\"").unwrap();
        assert_eq!(ok.to_string(), "74794423");
        assert!(serde_json::from_str::<MatchId>("\"\"").is_err());
    }

    #[test]
    fn test_client_id_uniqueness() {
        let a = ClientId::new();
        let b = ClientId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_court_id_display() {
        let court = CourtId::new("centre").unwrap();
        assert_eq!(court.to_string(), "centre");
        assert!(CourtId::new("").is_err());
    }
}
