//! Beacon integration test harness.
//!
//! Most tests run two registries in one process that gossip over unicast
//! loopback UDP: each one's channel targets the other's receive socket, so
//! no multicast routing is needed. The multicast tests join the real group
//! and skip gracefully when the host cannot.
//!
//!   cargo test --test integration

use std::future::Future;
use std::net::UdpSocket;
use std::time::Duration;

use anyhow::{Context, Result};
use beacon_core::config::TimingConfig;
use libbeacon::{ApiRegistry, MulticastChannel};

mod convergence;
mod multicast;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Timing fast enough for tests while keeping resend < lifespan.
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        lifespan_secs: 2,
        resend_interval_secs: 1,
        cleanup_interval_secs: 1,
    }
}

/// Two registries, each announcing straight to the other.
pub fn loopback_pair(timing: TimingConfig) -> Result<(ApiRegistry, ApiRegistry)> {
    let socket_a = UdpSocket::bind("127.0.0.1:0").context("bind a")?;
    let socket_b = UdpSocket::bind("127.0.0.1:0").context("bind b")?;
    let addr_a = socket_a.local_addr()?;
    let addr_b = socket_b.local_addr()?;

    let a = ApiRegistry::with_socket(socket_a, MulticastChannel::to_addr(addr_b), timing.clone())?;
    let b = ApiRegistry::with_socket(socket_b, MulticastChannel::to_addr(addr_a), timing)?;
    Ok((a, b))
}

/// Poll `probe` until it yields `Some`, or give up after `wait`.
pub async fn eventually<T, F, Fut>(wait: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    tokio::time::timeout(wait, async {
        loop {
            if let Some(v) = probe().await {
                return v;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .ok()
}
