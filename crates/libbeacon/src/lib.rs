//! libbeacon: decentralized service discovery over UDP multicast.
//!
//! Processes on the same network segment announce named, versioned service
//! endpoints and discover each other's without a central directory:
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use beacon_core::BeaconConfig;
//! use libbeacon::ApiRegistry;
//!
//! let registry = ApiRegistry::start(&BeaconConfig::default())?;
//! registry.register_api("search", "1.0", 8080).await?;
//! for api in registry.get_apis_by_name("billing").await {
//!     println!("{}:{}", api.host_ip(), api.host_port());
//! }
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! Delivery is best effort. Owned registrations are re-announced every
//! resend interval and remote ones expire when their lifespan runs out.

pub mod channel;
pub mod cleanup;
pub mod error;
pub mod listener;
pub mod registry;
pub mod resend;

pub use beacon_services::{Api, OwnedApi};
pub use channel::MulticastChannel;
pub use error::RegistryError;
pub use registry::ApiRegistry;
