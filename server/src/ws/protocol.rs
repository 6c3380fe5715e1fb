use crate::relay::events::ClientEvent;
use crate::relay::registry::ConnectionId;
use crate::relay::Relay;

/// Handle an incoming text frame: decode the event and hand it to the relay.
///
/// Frames that do not decode are dropped without a reply. Clients get no
/// error signal from the relay for any failure.
pub async fn handle_text_message(text: &str, relay: &Relay, connection_id: &ConnectionId) {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection_id,
                error = %e,
                "Dropping malformed frame: {}",
                text.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    relay.handle(connection_id, event).await;
}

/// Binary frames are accepted when they carry UTF-8 JSON.
pub async fn handle_binary_message(data: &[u8], relay: &Relay, connection_id: &ConnectionId) {
    match std::str::from_utf8(data) {
        Ok(text) => handle_text_message(text, relay, connection_id).await,
        Err(_) => {
            tracing::debug!(
                connection_id = %connection_id,
                len = data.len(),
                "Dropping non UTF-8 binary frame"
            );
        }
    }
}
