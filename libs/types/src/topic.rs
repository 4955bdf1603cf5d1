//! Subscription topics for the real-time channel
//!
//! A topic names a room a client can join. Two namespaces exist and are
//! independent of each other:
//! - `match:<matchId>`: updates for one match
//! - `court:<courtId>`: updates for one venue

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TopicError;
use crate::ids::{CourtId, MatchId};

/// A room a client can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Topic {
    /// Updates for a single match: `match:{id}`
    Match(MatchId),
    /// Updates for a single court: `court:{id}`
    Court(CourtId),
}

impl Topic {
    pub const MATCH_PREFIX: &'static str = "match";
    pub const COURT_PREFIX: &'static str = "court";

    /// Parse a topic string.
    ///
    /// Formats:
    /// - `match:74794423-3c57-44e8-96a1-ce5d8954887e`
    /// - `court:centre`
    pub fn parse(s: &str) -> Result<Self, TopicError> {
        let (namespace, id) = s
            .split_once(':')
            .ok_or_else(|| TopicError::Malformed(s.to_string()))?;

        match namespace {
            Self::MATCH_PREFIX => MatchId::new(id)
                .map(Topic::Match)
                .map_err(|_| TopicError::Malformed(s.to_string())),
            Self::COURT_PREFIX => CourtId::new(id)
                .map(Topic::Court)
                .map_err(|_| TopicError::Malformed(s.to_string())),
            other => Err(TopicError::UnknownNamespace(other.to_string())),
        }
    }

    /// Namespace half of the topic string.
    pub fn namespace(&self) -> &'static str {
        match self {
            Topic::Match(_) => Self::MATCH_PREFIX,
            Topic::Court(_) => Self::COURT_PREFIX,
        }
    }
}

impl TryFrom<String> for Topic {
    type Error = TopicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::parse(&value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.to_string()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Topic::Match(id) => id.as_str(),
            Topic::Court(id) => id.as_str(),
        };
        write!(f, "{}:{}", self.namespace(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_parse() {
        let topic = Topic::parse("match:m1").unwrap();
        assert_eq!(topic, Topic::Match(MatchId::new("m1").unwrap()));

        let topic = Topic::parse("court:centre").unwrap();
        assert_eq!(topic, Topic::Court(CourtId::new("centre").unwrap()));

        assert!(matches!(
            Topic::parse("venue:1"),
            Err(TopicError::UnknownNamespace(_))
        ));
        assert!(Topic::parse("match:").is_err());
        assert!(Topic::parse("invalid").is_err());
    }

    #[test]
    fn test_topic_to_string() {
        let topic = Topic::Match(MatchId::new("m1").unwrap());
        assert_eq!(topic.to_string(), "match:m1");
        assert_eq!(topic.namespace(), "match");
    }

    #[test]
    fn test_topic_keeps_colons_in_id() {
        let topic = Topic::parse("court:hall:3").unwrap();
        assert_eq!(topic.to_string(), "court:hall:3");
    }

    #[test]
    fn test_namespaces_are_distinct() {
        let m = Topic::parse("match:1").unwrap();
        let c = Topic::parse("court:1").unwrap();
        assert_ne!(m, c);
    }
}
