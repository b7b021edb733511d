//! Registration store: what this process has learned and what it advertises.
//!
//! Two independent maps, each behind its own reader/writer lock:
//!
//! - remote: service name → registrations observed on the network,
//!   written only by the listener and pruned only by the cleanup sweep.
//! - owned: service name → the one advertisement this process makes for it.
//!
//! No operation holds both locks at once.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

// ── Api ───────────────────────────────────────────────────────────────────────

/// A service endpoint as seen by this process.
///
/// Two values are the same registration when name, version, host IP and host
/// port all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Api {
    name: String,
    version: String,
    host_ip: IpAddr,
    host_port: u16,
}

impl Api {
    pub fn new(name: impl Into<String>, version: impl Into<String>, host_ip: IpAddr, host_port: u16) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            host_ip,
            host_port,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Source address of the announcement datagram.
    pub fn host_ip(&self) -> IpAddr {
        self.host_ip
    }

    /// Port advertised inside the announcement.
    pub fn host_port(&self) -> u16 {
        self.host_port
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({}:{})",
            self.name, self.version, self.host_ip, self.host_port
        )
    }
}

// ── ApiRegistration ───────────────────────────────────────────────────────────

/// A remote observation of an [`Api`].
#[derive(Debug, Clone)]
pub struct ApiRegistration {
    pub api: Api,
    /// When the last matching announcement arrived.
    pub last_seen: Instant,
    /// Lifespan promised by the sender in that announcement.
    pub lifespan: Duration,
}

impl ApiRegistration {
    /// Active while `last_seen + lifespan` is still in the future.
    ///
    /// A lifespan too large to represent as an instant never expires.
    pub fn is_active_at(&self, now: Instant) -> bool {
        match self.last_seen.checked_add(self.lifespan) {
            Some(expires) => expires > now,
            None => true,
        }
    }
}

// ── OwnedApi ──────────────────────────────────────────────────────────────────

/// A service this process advertises. The host is implicitly this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedApi {
    pub name: String,
    pub version: String,
    pub port: u16,
}

/// Outcome of [`RegistrationStore::upsert_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Refreshed,
}

/// Outcome of [`RegistrationStore::own_api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Claimed,
    /// The name is already advertised, possibly with another version.
    AlreadyOwned,
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Shared registration state, handed to every loop as `Arc<RegistrationStore>`.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    remote: RwLock<HashMap<String, Vec<ApiRegistration>>>,
    owned: RwLock<HashMap<String, OwnedApi>>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting of `api`, refreshing the exact 4-tuple match if one exists.
    pub async fn upsert_remote(&self, api: Api, lifespan: Duration) -> Upsert {
        self.upsert_remote_at(api, lifespan, Instant::now()).await
    }

    pub async fn upsert_remote_at(&self, api: Api, lifespan: Duration, now: Instant) -> Upsert {
        let mut remote = self.remote.write().await;
        let regs = remote.entry(api.name.clone()).or_default();

        if let Some(existing) = regs.iter_mut().find(|r| r.api == api) {
            existing.last_seen = now;
            existing.lifespan = lifespan;
            return Upsert::Refreshed;
        }

        regs.push(ApiRegistration {
            api,
            last_seen: now,
            lifespan,
        });
        Upsert::Inserted
    }

    /// Active registrations for one name, in first-seen order.
    pub async fn active_by_name(&self, name: &str) -> Vec<Api> {
        self.active_by_name_at(name, Instant::now()).await
    }

    pub async fn active_by_name_at(&self, name: &str, now: Instant) -> Vec<Api> {
        let remote = self.remote.read().await;
        remote
            .get(name)
            .map(|regs| active_apis(regs, now).collect())
            .unwrap_or_default()
    }

    /// Active registrations across every known name.
    pub async fn all_active(&self) -> Vec<Api> {
        self.all_active_at(Instant::now()).await
    }

    pub async fn all_active_at(&self, now: Instant) -> Vec<Api> {
        let remote = self.remote.read().await;
        remote
            .values()
            .flat_map(|regs| active_apis(regs, now))
            .collect()
    }

    /// Drop inactive registrations and any name left without one.
    /// Returns how many registrations were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now()).await
    }

    pub async fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut remote = self.remote.write().await;
        let mut removed = 0;
        remote.retain(|_, regs| {
            let before = regs.len();
            regs.retain(|r| r.is_active_at(now));
            removed += before - regs.len();
            !regs.is_empty()
        });
        removed
    }

    /// Number of names in the remote map, expired entries included.
    pub async fn remote_len(&self) -> usize {
        self.remote.read().await.len()
    }

    /// Claim `name` for this process. The first claim wins.
    pub async fn own_api(&self, name: &str, version: &str, port: u16) -> Ownership {
        let mut owned = self.owned.write().await;
        if owned.contains_key(name) {
            return Ownership::AlreadyOwned;
        }
        owned.insert(
            name.to_string(),
            OwnedApi {
                name: name.to_string(),
                version: version.to_string(),
                port,
            },
        );
        Ownership::Claimed
    }

    pub async fn owns(&self, name: &str) -> bool {
        self.owned.read().await.contains_key(name)
    }

    /// Snapshot of owned advertisements, so callers can send without holding the lock.
    pub async fn owned_apis(&self) -> Vec<OwnedApi> {
        self.owned.read().await.values().cloned().collect()
    }

    pub async fn owned_len(&self) -> usize {
        self.owned.read().await.len()
    }
}

fn active_apis(regs: &[ApiRegistration], now: Instant) -> impl Iterator<Item = Api> + '_ {
    regs.iter()
        .filter(move |r| r.is_active_at(now))
        .map(|r| r.api.clone())
}
