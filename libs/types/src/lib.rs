//! Types library for the live tennis scoreboard relay
//!
//! Core type definitions shared by the scoring pipeline and the gateway,
//! so that the normalizer, the store and the real-time channel agree on one
//! canonical shape regardless of how the upstream scoring feed is laid out.
//!
//! # Modules
//! - `ids`: Identifiers (MatchId, CourtId, ClientId)
//! - `topic`: Subscription topics (`match:<id>`, `court:<id>`)
//! - `score`: Canonical score update types (status, server, sets, sides)
//! - `scoreboard`: Display projection and stored snapshot
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod topic;
pub mod score;
pub mod scoreboard;
pub mod errors;
