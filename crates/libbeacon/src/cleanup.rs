//! Expired-registration sweep.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time;

use beacon_core::config::TimingConfig;
use beacon_services::RegistrationStore;

/// Remove remote registrations whose lifespan has elapsed, once per
/// `cleanup_interval`, until shutdown.
///
/// Queries already filter expired entries, so the sweep only bounds memory.
pub async fn cleanup_loop(
    store: Arc<RegistrationStore>,
    timing: TimingConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = timing.cleanup_interval();
    let mut interval = time::interval_at(time::Instant::now() + period, period);

    tracing::info!(interval_secs = timing.cleanup_interval_secs, "registration cleanup starting");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("registration cleanup stopping");
                return;
            }
            _ = interval.tick() => {}
        }

        let removed = store.sweep_expired().await;
        if removed > 0 {
            tracing::debug!(removed, "expired remote registrations");
        }
    }
}
