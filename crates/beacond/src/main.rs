//! beacond: Beacon service-discovery daemon.
//!
//! Hosts one registry, announces the services listed in the config file and
//! serves the local HTTP API used by beacon-ctl.

use std::sync::Arc;

use anyhow::{Context, Result};

use beacon_core::config::BeaconConfig;
use libbeacon::ApiRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = BeaconConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = BeaconConfig::load().context("failed to load config")?;

    tracing::info!(
        group = %config.network.group,
        port = config.network.port,
        interface = %config.network.interface,
        "beacond starting"
    );
    if config.timing.resend_margin_is_thin() {
        tracing::warn!(
            resend_interval_secs = config.timing.resend_interval_secs,
            lifespan_secs = config.timing.lifespan_secs,
            "fewer than two resends fit in one lifespan, one lost datagram can expire a live service"
        );
    }

    let registry = Arc::new(ApiRegistry::start(&config)?);

    // Announce configured services
    for service in &config.services {
        match registry
            .register_api(&service.name, &service.version, service.port)
            .await
        {
            Ok(()) => tracing::info!(
                name = %service.name,
                version = %service.version,
                port = service.port,
                "service announced"
            ),
            // Not owned, so the resend loop will not retry it.
            Err(e) => tracing::error!(name = %service.name, error = %e, "failed to announce service"),
        }
    }

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let api_task = {
        let state = beacon_api::ApiState {
            registry: registry.clone(),
            shutdown_tx: shutdown_tx.clone(),
        };
        let port = config.network.api_port;
        tokio::spawn(async move {
            if let Err(e) = beacon_api::serve(state, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    let listener_watch = {
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                if registry.listener_finished().await {
                    return;
                }
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = api_task           => tracing::error!("API task exited: {:?}", r),
        _ = listener_watch     => tracing::error!("registry listener exited"),
    }

    let _ = shutdown_tx.send(());
    registry.shutdown().await;

    Ok(())
}
