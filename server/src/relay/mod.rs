//! The realtime relay.
//!
//! One [`Relay`] exists per server process. It owns the connection registry
//! and the broadcast scopes, and is handed to every connection actor through
//! the axum state. Delivery is best effort: an event for a user without a
//! live connection is dropped, and nothing is ever reported back to the
//! sender.

pub mod events;
pub mod registry;
pub mod scopes;

use std::sync::Arc;

use crate::calls::signaling;
use crate::chat::{groups, messages, presence, typing};
use crate::store::PresenceStore;
use events::{ClientEvent, ServerEvent, Welcome};
use registry::{ConnectionId, ConnectionRegistry, EventSender};
use scopes::ScopeRegistry;

pub struct Relay {
    registry: ConnectionRegistry,
    scopes: ScopeRegistry,
    store: Arc<dyn PresenceStore>,
}

impl Relay {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            scopes: ScopeRegistry::new(),
            store,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    pub fn store(&self) -> &dyn PresenceStore {
        self.store.as_ref()
    }

    /// Accept a new transport session. The session is greeted with its
    /// connection id and can receive broadcasts immediately, but is not
    /// reachable by user id until it sends `addUser`.
    pub fn connect(&self, tx: EventSender) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let welcome = ServerEvent::Connected(Welcome {
            connection_id: connection_id.to_string(),
        });
        if tx.send(welcome).is_err() {
            tracing::debug!(
                connection_id = %connection_id,
                "Writer gone before greeting, connected event dropped"
            );
        }
        self.registry.attach(connection_id.clone(), tx);

        tracing::info!(connection_id = %connection_id, "A user connected");
        connection_id
    }

    /// Dispatch one inbound event from `connection_id`.
    pub async fn handle(&self, connection_id: &ConnectionId, event: ClientEvent) {
        tracing::trace!(
            connection_id = %connection_id,
            event = event.name(),
            "Inbound event"
        );

        match event {
            ClientEvent::AddUser(user_id) => {
                self.add_user(connection_id, &user_id);
            }
            ClientEvent::SendMessage(message) => {
                messages::forward_direct_message(self, message);
            }
            ClientEvent::Typing(notice) => {
                typing::forward_typing(self, notice);
            }
            ClientEvent::UpdatePresence(change) => {
                presence::update_presence(self, connection_id, change).await;
            }
            ClientEvent::JoinGroup(group_id) => {
                groups::join_group(self, connection_id, &group_id);
            }
            ClientEvent::LeaveGroup(group_id) => {
                groups::leave_group(self, connection_id, &group_id);
            }
            ClientEvent::SendGroupMessage(message) => {
                messages::forward_group_message(self, message);
            }
            ClientEvent::CallUser(offer) => {
                signaling::call_user(self, offer);
            }
            ClientEvent::AnswerCall(answer) => {
                signaling::answer_call(self, answer);
            }
            ClientEvent::EndCall(hangup) => {
                signaling::end_call(self, hangup);
            }
        }
    }

    /// Bind a client-declared user id to the connection. The id is trusted
    /// as-is.
    pub fn add_user(&self, connection_id: &ConnectionId, user_id: &str) {
        let previous = self.registry.register_identity(user_id, connection_id);

        match previous {
            Some(previous) if previous != *connection_id => {
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    replaced = %previous,
                    "User re-bound to a new connection"
                );
            }
            _ => {
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    "User added"
                );
            }
        }
    }

    /// Tear down a closed transport session: leave all scopes, unbind its
    /// user, mark them offline and tell everyone else.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        self.registry.detach(connection_id);
        let scopes_left = self.scopes.leave_all(connection_id);
        let user_id = presence::mark_offline(self, connection_id).await;

        tracing::info!(
            connection_id = %connection_id,
            user_id = ?user_id,
            scopes_left,
            "User disconnected"
        );
    }
}
