//! Presence updates and the offline transition on disconnect.
//!
//! Presence is written to the [`PresenceStore`](crate::store::PresenceStore)
//! and broadcast to every other connected client, contacts or not. A failed
//! store write is logged and the broadcast still goes out.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::relay::events::{PresenceBroadcast, PresenceChange, ServerEvent};
use crate::relay::registry::ConnectionId;
use crate::relay::Relay;
use crate::state::AppState;
use crate::store::{PresenceFields, PresenceRecord};

// --- Functions called from the relay ---

/// Persist a client-reported presence change and broadcast it.
/// Returns the number of connections the broadcast reached.
pub async fn update_presence(
    relay: &Relay,
    connection_id: &ConnectionId,
    change: PresenceChange,
) -> usize {
    let now = Utc::now();
    let fields = PresenceFields {
        is_online: change.is_online,
        status: change.status.clone(),
        last_seen: now,
        socket_id: Some(connection_id.to_string()),
    };

    if let Err(e) = relay.store().update_presence(&change.user_id, &fields).await {
        tracing::warn!(
            user_id = %change.user_id,
            error = %e,
            "Error updating presence"
        );
    }

    let event = ServerEvent::PresenceUpdate(PresenceBroadcast {
        user_id: change.user_id,
        is_online: change.is_online,
        status: change.status,
        last_seen: now,
    });
    relay.registry().broadcast_except(connection_id, &event)
}

/// Unbind the user of a closed connection, record them offline and
/// broadcast the offline state once. Returns the user that went offline.
pub async fn mark_offline(relay: &Relay, connection_id: &ConnectionId) -> Option<String> {
    let user_id = relay.registry().remove_by_connection(connection_id)?;
    let now = Utc::now();

    if let Err(e) = relay
        .store()
        .update_presence(&user_id, &PresenceFields::offline(now))
        .await
    {
        tracing::warn!(
            user_id = %user_id,
            error = %e,
            "Error updating offline status"
        );
    }

    let event = ServerEvent::PresenceUpdate(PresenceBroadcast {
        user_id: user_id.clone(),
        is_online: Some(false),
        status: None,
        last_seen: now,
    });
    relay.registry().broadcast_except(connection_id, &event);

    Some(user_id)
}

// --- REST endpoint handlers ---

/// GET /api/presence/{user_id}: stored presence for one user.
pub async fn get_presence(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceRecord>, StatusCode> {
    match state.relay.store().get_presence(&user_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to read presence");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
