//! Error types for the scoreboard relay
//!
//! Every error here is reported to the immediate caller as a structured
//! result; none of them is allowed to abort the pipeline or leak into
//! another client's state.

use thiserror::Error;

use crate::ids::ClientId;

/// Identifier construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("{kind} id must not be empty")]
    Empty { kind: &'static str },
}

/// Topic parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("Malformed topic: {0}")]
    Malformed(String),

    #[error("Unknown topic namespace: {0}")]
    UnknownNamespace(String),
}

/// Normalization failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// No candidate field resolved to a non-empty match identifier
    #[error("Match ID not found in scoring data")]
    MissingMatchId,

    /// The payload has a shape the input schema cannot accept
    #[error("Malformed scoring data: {0}")]
    MalformedInput(String),
}

/// Scoreboard store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No scoring data found for match {match_id}")]
    NotFound { match_id: String },
}

/// Subscription registry contract violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Client {0} is already connected")]
    DuplicateConnect(ClientId),

    #[error("Client {0} is not connected")]
    UnknownClient(ClientId),

    #[error("Client {client_id} reached the topic limit ({limit})")]
    TopicLimit { client_id: ClientId, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_match_id_message() {
        assert_eq!(
            NormalizeError::MissingMatchId.to_string(),
            "Match ID not found in scoring data"
        );
    }

    #[test]
    fn test_registry_error_display() {
        let id = ClientId::new();
        let err = RegistryError::TopicLimit { client_id: id, limit: 2 };
        assert!(err.to_string().contains("topic limit (2)"));
    }
}
