use crate::relay::events::{ServerEvent, TypingDelivery, TypingNotice};
use crate::relay::Relay;

/// Relay a typing indicator 1:1 to the receiver. Every event is forwarded;
/// the recorded flag never suppresses a repeat.
pub fn forward_typing(relay: &Relay, notice: TypingNotice) -> bool {
    relay
        .registry()
        .set_typing(&notice.sender_id, notice.is_typing);

    relay.registry().send_to_user(
        &notice.receiver_id,
        ServerEvent::UserTyping(TypingDelivery {
            sender_id: notice.sender_id,
            is_typing: notice.is_typing,
        }),
    )
}
