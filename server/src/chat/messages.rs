//! Direct and group message forwarding.
//!
//! Messages are relayed, not stored: an offline receiver simply never sees
//! the message and the sender is not told.

use chrono::Utc;

use crate::relay::events::{
    DirectMessage, GroupMessage, GroupMessageDelivery, MessageDelivery, ServerEvent,
};
use crate::relay::scopes::group_scope;
use crate::relay::Relay;

/// Forward a direct message to the receiver's connection, stamped with the
/// server time. Returns whether it was queued for delivery.
pub fn forward_direct_message(relay: &Relay, message: DirectMessage) -> bool {
    let DirectMessage {
        receiver_id,
        content,
        sender_id,
    } = message;

    let event = ServerEvent::ReceiveMessage(MessageDelivery {
        sender: sender_id.clone(),
        receiver: receiver_id.clone(),
        content,
        timestamp: Utc::now(),
    });

    let delivered = relay.registry().send_to_user(&receiver_id, event);
    if !delivered {
        tracing::debug!(
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Receiver offline, message dropped"
        );
    }
    delivered
}

/// Forward a group message to every connection joined to the group's
/// scope, the sender's own connection included. Returns the delivery count.
pub fn forward_group_message(relay: &Relay, message: GroupMessage) -> usize {
    let GroupMessage {
        group_id,
        content,
        sender_id,
    } = message;

    let scope = group_scope(&group_id);
    let event = ServerEvent::ReceiveGroupMessage(GroupMessageDelivery {
        group_id: group_id.clone(),
        sender: sender_id.clone(),
        content,
        timestamp: Utc::now(),
    });

    let delivered = relay
        .scopes()
        .members(&scope)
        .iter()
        .filter(|connection_id| relay.registry().send_to(connection_id, event.clone()))
        .count();

    tracing::debug!(
        group_id = %group_id,
        sender_id = %sender_id,
        delivered,
        "Group message relayed"
    );
    delivered
}
