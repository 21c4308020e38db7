pub mod websocket;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::error::{Error, Result};
use crate::hub::BroadcastHub;

/// Shared state for the HTTP/WebSocket layer.
pub struct ApiState {
    pub hub: Arc<BroadcastHub>,
}

pub fn create_router(state: Arc<ApiState>, allowed_origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(cors_layer(allowed_origins)?)
        .with_state(state))
}

async fn health_check() -> &'static str {
    "OK"
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| Error::InvalidOrigin(o.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
