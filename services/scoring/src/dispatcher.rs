//! Broadcast dispatcher and per-client flow control
//!
//! Owns the [`SubscriptionRegistry`] together with one bounded outbound
//! queue per connected client. A publish never waits on a client: frames
//! are offered with `try_send`, and a full queue is handled by the
//! configured [`DropPolicy`] so one slow viewer cannot stall the fanout.
//!
//! Each publish runs two channels:
//! 1. room fanout to every subscriber of `match:<id>`
//! 2. global fanout of the same update to every other connected client
//!
//! A client receives at most one copy per publish.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use types::errors::RegistryError;
use types::ids::{ClientId, MatchId};
use types::scoreboard::ScoreboardProjection;
use types::topic::Topic;

use crate::protocol::{ClientMessage, Frame, ServerEvent};
use crate::registry::{RegistryConfig, SubscriptionRegistry};

/// What to do when a client's outbound queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Skip this frame for the lagging client.
    DropMessage,
    /// Detach the lagging client; its connection closes.
    Disconnect,
}

impl FromStr for DropPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" | "drop_message" => Ok(DropPolicy::DropMessage),
            "disconnect" => Ok(DropPolicy::Disconnect),
            other => Err(format!("unknown drop policy: {}", other)),
        }
    }
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Frames buffered per client before the drop policy applies.
    pub queue_capacity: usize,
    pub drop_policy: DropPolicy,
    pub registry: RegistryConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            drop_policy: DropPolicy::DropMessage,
            registry: RegistryConfig::default(),
        }
    }
}

/// Outcome of offering one frame to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Dropped,
    Detach,
}

/// Outbound side of one client connection.
#[derive(Debug)]
struct ClientOutbox {
    tx: mpsc::Sender<Frame>,
    messages_dropped: u64,
}

impl ClientOutbox {
    fn offer(&mut self, frame: &Frame, policy: DropPolicy) -> Delivery {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => match policy {
                DropPolicy::DropMessage => {
                    self.messages_dropped += 1;
                    Delivery::Dropped
                }
                DropPolicy::Disconnect => Delivery::Detach,
            },
            Err(TrySendError::Closed(_)) => Delivery::Detach,
        }
    }
}

/// Summary of one publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Frames queued for subscribers of the match topic.
    pub room_deliveries: usize,
    /// Frames queued for every other connected client.
    pub global_deliveries: usize,
    /// Frames skipped because a client queue was full.
    pub dropped: usize,
    /// Clients detached during this publish.
    pub detached: Vec<ClientId>,
}

/// Fans score updates out to connected clients.
pub struct Dispatcher {
    registry: SubscriptionRegistry,
    outboxes: BTreeMap<ClientId, ClientOutbox>,
    config: DispatchConfig,
    /// Total frames dropped since creation.
    total_dropped: u64,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            registry: SubscriptionRegistry::new(config.registry.clone()),
            outboxes: BTreeMap::new(),
            config,
            total_dropped: 0,
        }
    }

    /// Register a client and open its outbound queue.
    ///
    /// The returned receiver is drained by the connection's writer; once the
    /// client is detached the sender is dropped and the receiver ends.
    pub fn attach(
        &mut self,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> Result<mpsc::Receiver<Frame>, RegistryError> {
        self.registry.connect(client_id, now)?;
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        self.outboxes.insert(
            client_id,
            ClientOutbox {
                tx,
                messages_dropped: 0,
            },
        );
        Ok(rx)
    }

    /// Remove a client. Silent when the client is unknown.
    pub fn detach(&mut self, client_id: ClientId) -> bool {
        let outbox = self.outboxes.remove(&client_id);
        let state = self.registry.disconnect(client_id);
        if let Some(outbox) = &outbox {
            if outbox.messages_dropped > 0 {
                debug!(%client_id, dropped = outbox.messages_dropped, "Client detached after drops");
            }
        }
        outbox.is_some() || state.is_some()
    }

    /// Apply a control message from a client.
    pub fn handle(&mut self, client_id: ClientId, message: ClientMessage) -> Result<(), RegistryError> {
        match message {
            ClientMessage::LeaveMatch { match_id } => {
                self.leave(client_id, &Topic::Match(match_id));
                Ok(())
            }
            join => self.join(client_id, join.topic()),
        }
    }

    /// Join a topic and acknowledge it. The acknowledgement is sent even
    /// when the topic was already held.
    pub fn join(&mut self, client_id: ClientId, topic: Topic) -> Result<(), RegistryError> {
        self.registry.join(client_id, topic.clone())?;

        let ack = match topic {
            Topic::Match(match_id) => ServerEvent::joined_match(match_id),
            Topic::Court(court_id) => ServerEvent::joined_court(court_id),
        };
        self.send_to(client_id, &ack);
        Ok(())
    }

    /// Leave a topic. Idempotent; no acknowledgement.
    pub fn leave(&mut self, client_id: ClientId, topic: &Topic) -> bool {
        self.registry.leave(client_id, topic)
    }

    /// Send one event to one client. Returns whether it was queued.
    pub fn send_to(&mut self, client_id: ClientId, event: &ServerEvent) -> bool {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(%client_id, event = event.name(), error = %e, "Failed to encode event");
                return false;
            }
        };

        let policy = self.config.drop_policy;
        let delivery = match self.outboxes.get_mut(&client_id) {
            Some(outbox) => outbox.offer(&frame, policy),
            None => return false,
        };

        match delivery {
            Delivery::Sent => true,
            Delivery::Dropped => {
                self.total_dropped += 1;
                false
            }
            Delivery::Detach => {
                self.detach(client_id);
                false
            }
        }
    }

    /// Deliver an accepted update: room fanout to `match:<match_id>`, then
    /// global fanout to every connected client not already reached.
    pub fn publish(&mut self, match_id: &MatchId, projection: &ScoreboardProjection) -> DispatchReport {
        let mut report = DispatchReport::default();

        let frame = match ServerEvent::ScoreUpdate(projection.clone()).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(%match_id, error = %e, "Failed to encode score update");
                return report;
            }
        };

        let policy = self.config.drop_policy;
        let topic = Topic::Match(match_id.clone());
        let room: BTreeSet<ClientId> = self.registry.subscribers(&topic).into_iter().collect();
        let mut detach = Vec::new();

        for client_id in &room {
            match self.outboxes.get_mut(client_id).map(|o| o.offer(&frame, policy)) {
                Some(Delivery::Sent) => report.room_deliveries += 1,
                Some(Delivery::Dropped) => report.dropped += 1,
                Some(Delivery::Detach) => detach.push(*client_id),
                None => {}
            }
        }

        for (client_id, outbox) in self.outboxes.iter_mut() {
            if room.contains(client_id) {
                continue;
            }
            match outbox.offer(&frame, policy) {
                Delivery::Sent => report.global_deliveries += 1,
                Delivery::Dropped => report.dropped += 1,
                Delivery::Detach => detach.push(*client_id),
            }
        }

        for client_id in &detach {
            self.detach(*client_id);
        }
        self.total_dropped += report.dropped as u64;

        if report.dropped > 0 || !detach.is_empty() {
            warn!(
                %match_id,
                dropped = report.dropped,
                detached = detach.len(),
                "Backpressure during score fanout"
            );
        }
        debug!(
            %match_id,
            room = %topic,
            room_deliveries = report.room_deliveries,
            global_deliveries = report.global_deliveries,
            "Broadcasted score update"
        );

        report.detached = detach;
        report
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Number of attached clients.
    pub fn client_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Total frames dropped since creation.
    pub fn total_dropped(&self) -> u64 {
        self.total_dropped
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}
