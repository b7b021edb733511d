//! HTTP API handlers: exposes registry state as JSON.

pub mod apis;
pub mod status;

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;

use libbeacon::{Api, ApiRegistry, RegistryError};

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<ApiRegistry>,
    /// Shutdown broadcast sender, signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// One discovered service as returned by every listing endpoint.
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
}

impl From<&Api> for ApiInfo {
    fn from(api: &Api) -> Self {
        Self {
            name: api.name().to_string(),
            version: api.version().to_string(),
            host: api.host_ip().to_string(),
            port: api.host_port(),
        }
    }
}

/// Map a registry error onto an HTTP status.
fn error_status(e: &RegistryError) -> StatusCode {
    match e {
        RegistryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        RegistryError::MessageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        RegistryError::NetworkSend(_) => StatusCode::BAD_GATEWAY,
        RegistryError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Re-export handler functions for use in router setup.
pub use apis::{handle_apis, handle_apis_by_name, handle_register};
pub use status::{handle_shutdown, handle_status};
