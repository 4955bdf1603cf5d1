//! Scoring Service
//!
//! Consumes raw scoring payloads from the upstream scoring application and
//! produces:
//! - A canonical score update and a display projection per payload
//! - The latest snapshot per match for retrieval
//! - Real-time fanout of every accepted update to connected viewers
//!
//! # Architecture
//!
//! ```text
//!   Raw scoring payload
//!          │
//!    ┌─────▼──────┐
//!    │ Normalizer │  ← precedence tables, typed lenient schema
//!    └─────┬──────┘
//!          │
//!    ┌─────▼──────┐
//!    │   Store    │  ← latest snapshot per match
//!    └─────┬──────┘
//!          │
//!    ┌─────▼──────┐      ┌──────────┐
//!    │ Dispatcher │ ───► │ Registry │  ← client → topics
//!    └─────┬──────┘      └──────────┘
//!          │
//!   room fanout + global fanout (bounded per-client queues)
//! ```

pub mod dispatcher;
pub mod normalizer;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod store;

pub use service::{IngestReceipt, MappingPreview, ScoringError, ScoringService, ServiceStats};
