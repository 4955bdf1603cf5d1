//! Scoring service facade
//!
//! One object the transport layer talks to. It wires the normalizer, the
//! store and the dispatcher together and serializes every mutation: an
//! ingest holds the dispatcher lock across `upsert` and `publish`, so the
//! order in which subscribers see updates for a match is the order in
//! which the store accepted them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use types::errors::{NormalizeError, RegistryError, StoreError};
use types::ids::{ClientId, MatchId};
use types::score::{CanonicalScoreUpdate, RawPayload};
use types::scoreboard::{ScoreboardProjection, ScoreboardSnapshot};

use crate::dispatcher::{DispatchConfig, DispatchReport, Dispatcher};
use crate::normalizer::normalize;
use crate::protocol::{parse_client_message, Frame, ServerEvent};
use crate::store::ScoreboardStore;

/// Errors surfaced by the scoring service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid real-time message: {0}")]
    BadFrame(String),
}

/// Result of an accepted ingest.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub match_id: MatchId,
    pub updated_at: DateTime<Utc>,
    /// Projection as stored and broadcast.
    pub projection: ScoreboardProjection,
    pub dispatch: DispatchReport,
}

/// Both mapped views of a payload, computed without side effects.
#[derive(Debug, Clone)]
pub struct MappingPreview {
    pub update: CanonicalScoreUpdate,
    pub projection: ScoreboardProjection,
    /// Length of the payload serialized as JSON.
    pub original_size: usize,
    /// Length of the projection serialized as JSON.
    pub simplified_size: usize,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    pub matches: usize,
    pub clients: usize,
    pub rooms: usize,
    pub frames_dropped: u64,
}

pub struct ScoringService {
    store: Arc<dyn ScoreboardStore>,
    dispatcher: Mutex<Dispatcher>,
}

impl ScoringService {
    pub fn new(store: Arc<dyn ScoreboardStore>, config: DispatchConfig) -> Self {
        info!(
            queue_capacity = config.queue_capacity,
            drop_policy = ?config.drop_policy,
            max_topics_per_client = config.registry.max_topics_per_client,
            "ScoringService initialized"
        );
        Self {
            store,
            dispatcher: Mutex::new(Dispatcher::new(config)),
        }
    }

    /// Normalize, store and broadcast one raw payload.
    pub fn ingest(&self, raw: RawPayload) -> Result<IngestReceipt, ScoringError> {
        let normalized = normalize(&raw, Utc::now()).inspect_err(|e| {
            warn!(error = %e, "Rejected scoring payload");
        })?;
        let match_id = normalized.projection.match_id.clone();

        let mut dispatcher = self.dispatcher();
        let snapshot = self.store.upsert(match_id.clone(), normalized.projection, raw);
        let dispatch = dispatcher.publish(&match_id, &snapshot.projection);
        drop(dispatcher);

        info!(
            %match_id,
            status = snapshot.projection.status.as_str(),
            room_deliveries = dispatch.room_deliveries,
            global_deliveries = dispatch.global_deliveries,
            "Score update accepted"
        );

        Ok(IngestReceipt {
            match_id,
            updated_at: snapshot.last_update,
            projection: snapshot.projection,
            dispatch,
        })
    }

    /// Latest snapshot for a match.
    pub fn scoreboard(&self, match_id: &str) -> Result<ScoreboardSnapshot, ScoringError> {
        Ok(self.store.get(match_id)?)
    }

    /// Map a payload without storing or broadcasting it.
    pub fn preview(&self, raw: &RawPayload) -> Result<MappingPreview, ScoringError> {
        let normalized = normalize(raw, Utc::now())?;
        let original_size = json_len(raw);
        let simplified_size = json_len(&normalized.projection);

        Ok(MappingPreview {
            update: normalized.update,
            projection: normalized.projection,
            original_size,
            simplified_size,
        })
    }

    /// Register a real-time client; the receiver yields its outbound frames.
    pub fn connect(&self, client_id: ClientId) -> Result<mpsc::Receiver<Frame>, ScoringError> {
        Ok(self.dispatcher().attach(client_id, Utc::now())?)
    }

    /// Handle one text frame from a client.
    ///
    /// An unparseable frame is answered with an `error` event on the same
    /// connection and reported as [`ScoringError::BadFrame`].
    pub fn handle_frame(&self, client_id: ClientId, text: &str) -> Result<(), ScoringError> {
        let mut dispatcher = self.dispatcher();

        match parse_client_message(text) {
            Ok(message) => Ok(dispatcher.handle(client_id, message)?),
            Err(e) => {
                let message = e.to_string();
                dispatcher.send_to(client_id, &ServerEvent::Error { message: message.clone() });
                Err(ScoringError::BadFrame(message))
            }
        }
    }

    /// Drop a client and its subscriptions. Silent for unknown clients.
    pub fn disconnect(&self, client_id: ClientId) {
        self.dispatcher().detach(client_id);
    }

    pub fn stats(&self) -> ServiceStats {
        let dispatcher = self.dispatcher();
        ServiceStats {
            matches: self.store.len(),
            clients: dispatcher.client_count(),
            rooms: dispatcher.registry().room_count(),
            frames_dropped: dispatcher.total_dropped(),
        }
    }

    fn dispatcher(&self) -> MutexGuard<'_, Dispatcher> {
        // Dispatcher state stays consistent across a panic in another
        // holder, so a poisoned lock is still usable.
        self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn json_len<T: serde::Serialize + ?Sized>(value: &T) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}
