//! Scoreboard store
//!
//! Latest-value map from match id to [`ScoreboardSnapshot`]. Each accepted
//! update replaces the previous snapshot wholesale; nothing is merged and
//! nothing is evicted while the process runs.
//!
//! The raw payload is retained next to every snapshot with no size limit,
//! so memory grows with the verbosity of the feed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use types::errors::StoreError;
use types::ids::MatchId;
use types::score::RawPayload;
use types::scoreboard::{ScoreboardProjection, ScoreboardSnapshot};

/// Storage seam for scoreboard snapshots.
pub trait ScoreboardStore: Send + Sync {
    /// Replace the snapshot for `match_id` and stamp it with the current
    /// time. Returns the snapshot as stored.
    fn upsert(
        &self,
        match_id: MatchId,
        projection: ScoreboardProjection,
        raw: RawPayload,
    ) -> ScoreboardSnapshot;

    /// Latest snapshot for a match.
    fn get(&self, match_id: &str) -> Result<ScoreboardSnapshot, StoreError>;

    /// Number of matches tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory store.
pub struct InMemoryStore {
    snapshots: DashMap<MatchId, ScoreboardSnapshot>,
    clock: fn() -> DateTime<Utc>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Store with a custom time source for `last_update` stamps.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            snapshots: DashMap::new(),
            clock,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreboardStore for InMemoryStore {
    fn upsert(
        &self,
        match_id: MatchId,
        mut projection: ScoreboardProjection,
        raw: RawPayload,
    ) -> ScoreboardSnapshot {
        let now = (self.clock)();
        projection.last_update = now;

        let snapshot = ScoreboardSnapshot {
            match_id: match_id.clone(),
            projection,
            raw,
            last_update: now,
        };

        let replaced = self.snapshots.insert(match_id, snapshot.clone()).is_some();
        debug!(
            match_id = %snapshot.match_id,
            replaced,
            tracked = self.snapshots.len(),
            "Scoreboard snapshot stored"
        );

        snapshot
    }

    fn get(&self, match_id: &str) -> Result<ScoreboardSnapshot, StoreError> {
        self.snapshots
            .get(match_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                match_id: match_id.to_string(),
            })
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }
}
