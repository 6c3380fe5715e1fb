use std::sync::Arc;

use crate::config::HeartbeatConfig;
use crate::relay::Relay;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide relay: connection registry, scopes and presence store
    pub relay: Arc<Relay>,
    /// Keepalive settings applied to each WebSocket connection
    pub heartbeat: HeartbeatConfig,
}
