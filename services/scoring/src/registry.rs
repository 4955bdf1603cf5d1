//! Subscription registry for the real-time channel
//!
//! Tracks, per connected client, the set of topics it has joined, and keeps
//! the reverse index so room-scoped delivery costs the size of the room
//! rather than the number of connected clients.
//!
//! Uses BTreeMap/BTreeSet so iteration order is stable.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use types::errors::RegistryError;
use types::ids::ClientId;
use types::topic::Topic;

/// Per-client subscription state.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub client_id: ClientId,
    /// Topics this client has joined.
    pub topics: BTreeSet<Topic>,
    pub connected_at: DateTime<Utc>,
}

impl ClientState {
    pub fn new(client_id: ClientId, connected_at: DateTime<Utc>) -> Self {
        Self {
            client_id,
            topics: BTreeSet::new(),
            connected_at,
        }
    }

    pub fn is_subscribed(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }
}

/// Configuration for the subscription registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Max topics a single client may hold.
    pub max_topics_per_client: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_topics_per_client: 64,
        }
    }
}

/// Client registry: tracks all connected clients and their topics.
pub struct SubscriptionRegistry {
    clients: BTreeMap<ClientId, ClientState>,
    rooms: BTreeMap<Topic, BTreeSet<ClientId>>,
    config: RegistryConfig,
}

impl SubscriptionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            clients: BTreeMap::new(),
            rooms: BTreeMap::new(),
            config,
        }
    }

    /// Register a client with an empty topic set.
    pub fn connect(&mut self, client_id: ClientId, now: DateTime<Utc>) -> Result<(), RegistryError> {
        if self.clients.contains_key(&client_id) {
            return Err(RegistryError::DuplicateConnect(client_id));
        }
        self.clients.insert(client_id, ClientState::new(client_id, now));
        info!(%client_id, clients = self.clients.len(), "Client connected");
        Ok(())
    }

    /// Join a topic. Idempotent; returns whether the topic was newly added.
    pub fn join(&mut self, client_id: ClientId, topic: Topic) -> Result<bool, RegistryError> {
        let limit = self.config.max_topics_per_client;
        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or(RegistryError::UnknownClient(client_id))?;

        if client.is_subscribed(&topic) {
            return Ok(false);
        }
        if client.topics.len() >= limit {
            return Err(RegistryError::TopicLimit { client_id, limit });
        }

        client.topics.insert(topic.clone());
        debug!(%client_id, %topic, "Client joined topic");
        self.rooms.entry(topic).or_default().insert(client_id);
        Ok(true)
    }

    /// Leave a topic. Idempotent, including for unknown clients; returns
    /// whether the topic was held.
    pub fn leave(&mut self, client_id: ClientId, topic: &Topic) -> bool {
        let removed = self
            .clients
            .get_mut(&client_id)
            .map(|client| client.topics.remove(topic))
            .unwrap_or(false);

        if removed {
            self.remove_from_room(client_id, topic);
            debug!(%client_id, %topic, "Client left topic");
        }
        removed
    }

    /// Remove a client and all of its memberships. Silent for unknown
    /// clients, so duplicate or late disconnect notifications are harmless.
    pub fn disconnect(&mut self, client_id: ClientId) -> Option<ClientState> {
        let state = self.clients.remove(&client_id)?;
        for topic in &state.topics {
            self.remove_from_room(client_id, topic);
        }
        let connected_secs = (Utc::now() - state.connected_at).num_seconds();
        info!(
            %client_id,
            topics = state.topics.len(),
            clients = self.clients.len(),
            connected_secs,
            "Client disconnected"
        );
        Some(state)
    }

    pub fn get(&self, client_id: ClientId) -> Option<&ClientState> {
        self.clients.get(&client_id)
    }

    pub fn is_connected(&self, client_id: ClientId) -> bool {
        self.clients.contains_key(&client_id)
    }

    /// Clients currently subscribed to a topic.
    pub fn subscribers(&self, topic: &Topic) -> Vec<ClientId> {
        self.rooms
            .get(topic)
            .map(|room| room.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Topics held by a client, empty for unknown clients.
    pub fn topics(&self, client_id: ClientId) -> Vec<Topic> {
        self.clients
            .get(&client_id)
            .map(|c| c.topics.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_from_room(&mut self, client_id: ClientId, topic: &Topic) {
        if let Some(room) = self.rooms.get_mut(topic) {
            room.remove(&client_id);
            if room.is_empty() {
                self.rooms.remove(topic);
            }
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
