//! Connection registry for the classroom coordinator.
//!
//! Tracks every registered connection with its name, role, and an outbound
//! queue. Delivery is queue-and-forget: senders never block and never fail
//! the caller — a connection whose queue is closed is simply pruned on the
//! next send that touches it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::error::{CoordinatorError, Result};
use crate::messages::{OutboundMessage, Role};

/// Source for connection ids, shared across the process.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// ConnectionId
// ============================================================================

/// Opaque identifier for one WebSocket connection.
///
/// Allocated at socket accept, before registration, so frames from
/// connections that never register still have an id to log against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A registered connection.
#[derive(Debug)]
pub struct Connection {
    /// Display name claimed at registration.
    pub name: String,

    /// Role claimed at registration.
    pub role: Role,

    /// When the connection registered.
    pub connected_at: DateTime<Utc>,

    /// When the connection last sent a decodable frame.
    pub last_activity: DateTime<Utc>,

    sender: mpsc::UnboundedSender<OutboundMessage>,
}

// ============================================================================
// ConnectionRegistry
// ============================================================================

/// Registry of live, registered connections.
///
/// The internal lock is held only for map access; queue sends are
/// synchronous, so no send ever happens across an await point while the
/// lock is held.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under a validated name and role.
    ///
    /// Returns the stored name (trimmed) and parsed role. Registering an id
    /// that is already present replaces the old entry; the stale queue is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::MissingName` for a blank name and
    /// `CoordinatorError::InvalidRole` for an unknown role string.
    pub async fn register(
        &self,
        id: ConnectionId,
        name: &str,
        role: &str,
        sender: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Result<(String, Role)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoordinatorError::MissingName);
        }
        let role = Role::parse(role)?;

        let now = Utc::now();
        let connection = Connection {
            name: name.to_string(),
            role,
            connected_at: now,
            last_activity: now,
            sender,
        };

        let mut connections = self.connections.lock().await;
        if let Some(previous) = connections.insert(id, connection) {
            warn!(
                conn_id = %id,
                previous_name = %previous.name,
                name,
                "connection re-registered, replacing previous identity"
            );
        } else {
            debug!(conn_id = %id, name, role = %role, "connection registered");
        }
        Ok((name.to_string(), role))
    }

    /// Removes a connection, returning its entry if it was registered.
    ///
    /// Safe to call for connections that never registered.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.lock().await.remove(&id);
        if let Some(connection) = &removed {
            debug!(conn_id = %id, name = %connection.name, "connection unregistered");
        }
        removed
    }

    /// Refreshes the last-activity timestamp for a connection.
    pub async fn touch(&self, id: ConnectionId) {
        if let Some(connection) = self.connections.lock().await.get_mut(&id) {
            connection.last_activity = Utc::now();
        }
    }

    /// Returns the registered name and role for a connection.
    pub async fn identity(&self, id: ConnectionId) -> Option<(String, Role)> {
        self.connections
            .lock()
            .await
            .get(&id)
            .map(|c| (c.name.clone(), c.role))
    }

    /// Queues a message to one connection.
    ///
    /// Returns `true` if the message was queued. A closed queue prunes the
    /// entry and returns `false`.
    pub async fn send_to(&self, id: ConnectionId, message: OutboundMessage) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(connection) = connections.get(&id) else {
            return false;
        };
        if connection.sender.send(message).is_err() {
            debug!(conn_id = %id, "outbound queue closed, pruning connection");
            connections.remove(&id);
            return false;
        }
        true
    }

    /// Queues a message to every connection of the given role.
    ///
    /// Dead connections found along the way are pruned. Returns the number
    /// of connections the message was queued for.
    pub async fn broadcast_to_role(&self, role: Role, message: &OutboundMessage) -> usize {
        let mut connections = self.connections.lock().await;
        let mut delivered = 0;
        let mut dead: Vec<ConnectionId> = Vec::new();

        for (id, connection) in connections.iter() {
            if connection.role != role {
                continue;
            }
            if connection.sender.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }
        for id in dead {
            debug!(conn_id = %id, "outbound queue closed, pruning connection");
            connections.remove(&id);
        }
        delivered
    }

    /// Queues a message to every registered connection.
    ///
    /// Dead connections found along the way are pruned. Returns the number
    /// of connections the message was queued for.
    pub async fn broadcast_all(&self, message: &OutboundMessage) -> usize {
        let mut connections = self.connections.lock().await;
        let mut delivered = 0;
        let mut dead: Vec<ConnectionId> = Vec::new();

        for (id, connection) in connections.iter() {
            if connection.sender.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }
        for id in dead {
            debug!(conn_id = %id, "outbound queue closed, pruning connection");
            connections.remove(&id);
        }
        delivered
    }

    /// Names of connections with the given role, sorted for stable output.
    pub async fn names_for_role(&self, role: Role) -> Vec<String> {
        let connections = self.connections.lock().await;
        let mut names: Vec<String> = connections
            .values()
            .filter(|c| c.role == role)
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of connections with the given role.
    pub async fn count_for_role(&self, role: Role) -> usize {
        self.connections
            .lock()
            .await
            .values()
            .filter(|c| c.role == role)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================
