//! /status and /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use libbeacon::OwnedApi;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub target: String,
    pub lifespan_secs: u64,
    pub resend_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    /// Names currently tracked, including ones awaiting the next sweep.
    pub remote_names: usize,
    pub active_apis: usize,
    pub owned: Vec<OwnedApi>,
    pub listener_running: bool,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let registry = &state.registry;
    let timing = registry.timing();

    Json(StatusResponse {
        target: registry.channel().target().to_string(),
        lifespan_secs: timing.lifespan_secs,
        resend_interval_secs: timing.resend_interval_secs,
        cleanup_interval_secs: timing.cleanup_interval_secs,
        remote_names: registry.store().remote_len().await,
        active_apis: registry.get_available_apis().await.len(),
        owned: registry.owned_apis().await,
        listener_running: !registry.listener_finished().await,
    })
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use beacon_core::TimingConfig;
    use libbeacon::{ApiRegistry, MulticastChannel};

    #[tokio::test]
    async fn status_reports_timing_and_ownership() {
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let registry = ApiRegistry::with_socket(
            socket,
            MulticastChannel::to_addr(peer.local_addr().unwrap()),
            TimingConfig::default(),
        )
        .unwrap();
        registry.register_api("search", "1.0", 8080).await.unwrap();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel(1);
        let state = ApiState {
            registry: Arc::new(registry),
            shutdown_tx,
        };

        let Json(status) = handle_status(State(state.clone())).await;
        assert_eq!(status.target, peer.local_addr().unwrap().to_string());
        assert_eq!(status.lifespan_secs, 90);
        assert_eq!(status.resend_interval_secs, 30);
        assert_eq!(status.cleanup_interval_secs, 90);
        assert_eq!(status.owned.len(), 1);
        assert_eq!(status.owned[0].name, "search");
        assert_eq!(status.active_apis, 0);
        assert!(status.listener_running);

        handle_shutdown(State(state.clone())).await;
        assert!(shutdown_rx.try_recv().is_ok());
        state.registry.shutdown().await;
    }
}
