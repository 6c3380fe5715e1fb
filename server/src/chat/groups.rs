//! Group broadcast scope membership.
//!
//! Joining only subscribes the connection to the group's broadcast scope.
//! Whether the user belongs to the group is not checked.

use crate::relay::registry::ConnectionId;
use crate::relay::scopes::group_scope;
use crate::relay::Relay;

pub fn join_group(relay: &Relay, connection_id: &ConnectionId, group_id: &str) -> bool {
    let joined = relay.scopes().join(&group_scope(group_id), connection_id);
    tracing::info!(
        connection_id = %connection_id,
        group_id = %group_id,
        already_joined = !joined,
        "User joined group"
    );
    joined
}

pub fn leave_group(relay: &Relay, connection_id: &ConnectionId, group_id: &str) -> bool {
    let left = relay.scopes().leave(&group_scope(group_id), connection_id);
    tracing::info!(
        connection_id = %connection_id,
        group_id = %group_id,
        "User left group"
    );
    left
}
