//! beacon-core: wire format, protocol constants and configuration.
//! All other Beacon crates depend on this one.

pub mod config;
pub mod wire;

pub use config::{BeaconConfig, ConfigError, NetworkConfig, ServiceEntry, TimingConfig};
pub use wire::{Announcement, WireError};
