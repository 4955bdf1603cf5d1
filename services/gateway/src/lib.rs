//! HTTP and WebSocket surface for the scoreboard.
//!
//! Routes:
//! - `POST /scoring/update`, `GET /scoring/scoreboard/{matchId}`,
//!   `POST /scoring/test-mapping` (API key required)
//! - `GET /ws` real-time channel
//! - `GET /health`

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
