use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chat::presence;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

#[derive(Debug, Serialize)]
pub struct RelayStats {
    pub connections: usize,
    pub identities: usize,
    pub scopes: usize,
}

/// GET /api/relay/stats: live registry sizes.
async fn relay_stats(State(state): State<AppState>) -> Json<RelayStats> {
    Json(RelayStats {
        connections: state.relay.registry().connection_count(),
        identities: state.relay.registry().identity_count(),
        scopes: state.relay.scopes().scope_count(),
    })
}

/// Build the CORS layer. An empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    // WebSocket endpoint
    let ws_routes = Router::new().route("/ws", get(ws_handler::ws_upgrade));

    let api_routes = Router::new()
        .route("/api/presence/{user_id}", get(presence::get_presence))
        .route("/api/relay/stats", get(relay_stats));

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(ws_routes)
        .merge(api_routes)
        .merge(health)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
