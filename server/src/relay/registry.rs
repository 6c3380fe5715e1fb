use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use super::events::ServerEvent;

/// Sender half of a connection's outbound event queue.
/// Unbounded: the relay never applies backpressure to a slow reader.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Opaque identifier of one live transport session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory connection and identity bookkeeping for one relay instance.
///
/// Three independent maps:
/// - `connections`: every open transport session and its outbound queue,
///   whether or not it has announced an identity.
/// - `identities`: user id -> connection, last writer wins.
/// - `typing`: last typing flag relayed for each sender.
///
/// Nothing here is persisted; a restart starts empty and clients must
/// announce themselves again.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, EventSender>,
    identities: DashMap<String, ConnectionId>,
    typing: DashMap<String, bool>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened transport session.
    pub fn attach(&self, connection_id: ConnectionId, tx: EventSender) {
        self.connections.insert(connection_id, tx);
    }

    /// Forget a transport session. Identity entries pointing at it are left
    /// alone; see [`remove_by_connection`](Self::remove_by_connection).
    pub fn detach(&self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    /// Bind `user_id` to `connection_id`, replacing any previous binding.
    /// Returns the connection the user was bound to before, if any.
    pub fn register_identity(
        &self,
        user_id: &str,
        connection_id: &ConnectionId,
    ) -> Option<ConnectionId> {
        self.identities.insert(user_id.to_string(), connection_id.clone())
    }

    pub fn lookup_connection(&self, user_id: &str) -> Option<ConnectionId> {
        self.identities.get(user_id).map(|entry| entry.value().clone())
    }

    /// Remove the first identity found bound to `connection_id` and return
    /// its user id. The scan stops at that match: further user ids declared
    /// on the same connection stay bound to it, and sends to them are
    /// swallowed once the connection is gone. The removed user's typing flag
    /// is cleared.
    ///
    /// A user who re-registered on another connection is not affected: the
    /// value is compared again under the shard lock before removal.
    pub fn remove_by_connection(&self, connection_id: &ConnectionId) -> Option<String> {
        let user_id = self
            .identities
            .iter()
            .find(|entry| entry.value() == connection_id)
            .map(|entry| entry.key().clone())?;

        let (user_id, _) = self
            .identities
            .remove_if(&user_id, |_, bound| bound == connection_id)?;
        self.typing.remove(&user_id);
        Some(user_id)
    }

    pub fn set_typing(&self, user_id: &str, is_typing: bool) {
        self.typing.insert(user_id.to_string(), is_typing);
    }

    /// Last typing flag seen for `user_id`. Kept for inspection only; relaying
    /// never consults it.
    pub fn is_typing(&self, user_id: &str) -> bool {
        self.typing.get(user_id).map(|flag| *flag).unwrap_or(false)
    }

    /// Queue an event on one connection. Returns false when the connection
    /// is unknown or its writer has gone away.
    pub fn send_to(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        match self.connections.get(connection_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Resolve `user_id` and queue an event on its connection.
    pub fn send_to_user(&self, user_id: &str, event: ServerEvent) -> bool {
        match self.lookup_connection(user_id) {
            Some(connection_id) => self.send_to(&connection_id, event),
            None => false,
        }
    }

    /// Queue an event on every connection except `origin`. Returns the
    /// number of connections the event was queued on.
    pub fn broadcast_except(&self, origin: &ConnectionId, event: &ServerEvent) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.key() != origin)
            .filter(|entry| entry.value().send(event.clone()).is_ok())
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_registration_wins() {
        let registry = ConnectionRegistry::new();
        let first = ConnectionId::from("c1");
        let second = ConnectionId::from("c2");

        assert_eq!(registry.register_identity("alice", &first), None);
        assert_eq!(registry.register_identity("alice", &second), Some(first.clone()));
        assert_eq!(registry.lookup_connection("alice"), Some(second.clone()));

        // The old connection closing must not evict the newer binding.
        assert_eq!(registry.remove_by_connection(&first), None);
        assert_eq!(registry.lookup_connection("alice"), Some(second));
    }

    #[test]
    fn removing_a_shared_connection_unbinds_one_user() {
        let registry = ConnectionRegistry::new();
        let shared = ConnectionId::from("c1");
        registry.register_identity("alice", &shared);
        registry.register_identity("bob", &shared);
        registry.set_typing("alice", true);
        registry.set_typing("bob", true);

        let removed = registry.remove_by_connection(&shared).expect("one user removed");
        let kept = if removed == "alice" { "bob" } else { "alice" };

        assert_eq!(registry.identity_count(), 1);
        assert_eq!(registry.lookup_connection(&removed), None);
        assert_eq!(registry.lookup_connection(kept), Some(shared.clone()));
        assert!(!registry.is_typing(&removed));
        assert!(registry.is_typing(kept));

        assert_eq!(registry.remove_by_connection(&shared).as_deref(), Some(kept));
        assert_eq!(registry.remove_by_connection(&shared), None);
    }

    #[test]
    fn send_to_closed_connection_reports_failure() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::from("c1");
        let (tx, rx) = mpsc::unbounded_channel();
        registry.attach(id.clone(), tx);
        drop(rx);

        assert!(!registry.send_to(&id, ServerEvent::CallEnded));
        assert!(!registry.send_to(&ConnectionId::from("missing"), ServerEvent::CallEnded));
    }

    #[test]
    fn broadcast_skips_origin() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for name in ["a", "b", "c"] {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.attach(ConnectionId::from(name), tx);
            receivers.push(rx);
        }

        let sent = registry.broadcast_except(&ConnectionId::from("a"), &ServerEvent::CallEnded);
        assert_eq!(sent, 2);
        assert!(receivers[0].try_recv().is_err());
        assert_eq!(receivers[1].try_recv().unwrap(), ServerEvent::CallEnded);
        assert_eq!(receivers[2].try_recv().unwrap(), ServerEvent::CallEnded);
    }
}
