//! Configuration system for Beacon.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $BEACON_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/beacon/config.toml
//!   3. ~/.config/beacon/config.toml

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use crate::wire::{
    CLEANUP_INTERVAL_SECS, MULTICAST_GROUP, MULTICAST_PORT, REGISTRATION_LIFESPAN_SECS,
    RESEND_INTERVAL_SECS,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub network: NetworkConfig,
    pub timing: TimingConfig,
    /// Services the daemon announces at startup.
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Multicast group shared by every participating process.
    pub group: Ipv4Addr,
    /// UDP port shared by every participating process.
    pub port: u16,
    /// Local interface address used to join the group and send. 0.0.0.0 = OS choice.
    pub interface: Ipv4Addr,
    /// Multicast TTL. 1 keeps announcements on the local segment.
    pub ttl: u32,
    /// Deliver our own announcements to listeners on this host.
    pub loopback: bool,
    /// Local HTTP API port.
    pub api_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Lifespan promised in every announcement we send.
    pub lifespan_secs: u64,
    pub resend_interval_secs: u64,
    pub cleanup_interval_secs: u64,
}

/// A service announced by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub version: String,
    pub port: u16,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            group: MULTICAST_GROUP,
            port: MULTICAST_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
            api_port: 5325,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lifespan_secs: REGISTRATION_LIFESPAN_SECS,
            resend_interval_secs: RESEND_INTERVAL_SECS,
            cleanup_interval_secs: CLEANUP_INTERVAL_SECS,
        }
    }
}

impl NetworkConfig {
    /// Destination of every announcement.
    pub fn group_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }
}

impl TimingConfig {
    pub fn lifespan(&self) -> Duration {
        Duration::from_secs(self.lifespan_secs)
    }

    pub fn resend_interval(&self) -> Duration {
        Duration::from_secs(self.resend_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// True when fewer than two resends fit inside one lifespan.
    pub fn resend_margin_is_thin(&self) -> bool {
        self.resend_interval_secs.saturating_mul(3) > self.lifespan_secs
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("beacon")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BeaconConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            BeaconConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("BEACON_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&BeaconConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Reject settings under which the registry cannot work at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.network.group.is_multicast() {
            return Err(ConfigError::Invalid(format!(
                "network.group {} is not a multicast address",
                self.network.group
            )));
        }
        let t = &self.timing;
        if t.lifespan_secs == 0 || t.resend_interval_secs == 0 || t.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "timing intervals must be non-zero".to_string(),
            ));
        }
        if t.resend_interval_secs >= t.lifespan_secs {
            return Err(ConfigError::Invalid(format!(
                "timing.resend_interval_secs ({}) must be shorter than timing.lifespan_secs ({})",
                t.resend_interval_secs, t.lifespan_secs
            )));
        }
        for s in &self.services {
            if s.name.is_empty() || s.version.is_empty() {
                return Err(ConfigError::Invalid(
                    "every [[services]] entry needs a name and a version".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Apply BEACON_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("BEACON_NETWORK__GROUP") {
            if let Ok(addr) = v.parse() {
                self.network.group = addr;
            }
        }
        if let Some(v) = var("BEACON_NETWORK__PORT") {
            if let Ok(p) = v.parse() {
                self.network.port = p;
            }
        }
        if let Some(v) = var("BEACON_NETWORK__INTERFACE") {
            if let Ok(addr) = v.parse() {
                self.network.interface = addr;
            }
        }
        if let Some(v) = var("BEACON_NETWORK__LOOPBACK") {
            self.network.loopback = v == "true" || v == "1";
        }
        if let Some(v) = var("BEACON_NETWORK__API_PORT") {
            if let Ok(p) = v.parse() {
                self.network.api_port = p;
            }
        }
        if let Some(v) = var("BEACON_TIMING__LIFESPAN_SECS") {
            if let Ok(s) = v.parse() {
                self.timing.lifespan_secs = s;
            }
        }
        if let Some(v) = var("BEACON_TIMING__RESEND_INTERVAL_SECS") {
            if let Ok(s) = v.parse() {
                self.timing.resend_interval_secs = s;
            }
        }
        if let Some(v) = var("BEACON_TIMING__CLEANUP_INTERVAL_SECS") {
            if let Ok(s) = v.parse() {
                self.timing.cleanup_interval_secs = s;
            }
        }
    }
}
