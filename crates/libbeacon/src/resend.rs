//! Owned-registration resend.
//!
//! Re-announces every owned registration on a fixed cadence so peers keep
//! refreshing it. If this loop stops, every peer drops our services once
//! the promised lifespan runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use beacon_core::config::TimingConfig;
use beacon_core::wire::Announcement;
use beacon_services::RegistrationStore;

use crate::channel::MulticastChannel;
use crate::error::RegistryError;

/// Encode and send one announcement.
pub fn announce(
    channel: &MulticastChannel,
    name: &str,
    version: &str,
    port: u16,
    lifespan: Duration,
) -> Result<(), RegistryError> {
    let payload = Announcement::new(name, version, port, lifespan).encode()?;
    channel.send(&payload)?;
    Ok(())
}

/// Re-send every owned registration each `resend_interval` until shutdown.
///
/// The first resend happens one full interval after start; registration
/// itself already sent the initial announcement.
pub async fn resend_loop(
    store: Arc<RegistrationStore>,
    channel: MulticastChannel,
    timing: TimingConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = timing.resend_interval();
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        interval_secs = timing.resend_interval_secs,
        target_addr = %channel.target(),
        "registration resend starting"
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("registration resend stopping");
                return;
            }
            _ = interval.tick() => {}
        }

        let owned = store.owned_apis().await;
        for api in &owned {
            match announce(&channel, &api.name, &api.version, api.port, timing.lifespan()) {
                Ok(()) => tracing::trace!(name = %api.name, version = %api.version, "resent"),
                Err(e) => tracing::warn!(
                    name = %api.name,
                    version = %api.version,
                    error = %e,
                    "resend failed, retrying next tick"
                ),
            }
        }
        tracing::debug!(count = owned.len(), "resend tick complete");
    }
}
