//! Beacon wire format: the announcement datagram and the protocol constants.
//!
//! These types ARE the protocol. Every participating process must agree on the
//! group address, the port, the field names and the lifespan unit, or peers
//! silently stop seeing each other.
//!
//! One announcement is one UDP datagram: a JSON object followed by a single
//! newline, e.g.
//!
//! ```text
//! {"ApiName":"search","ApiVersion":"1.0","ApiPort":8080,"LifeSpan":90000000000}
//! ```
//!
//! `LifeSpan` is an integer number of nanoseconds.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

// ── Constants ─────────────────────────────────────────────────────────────────

/// IPv4 multicast group every registry joins and announces to.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 78);

/// UDP port announcements are sent to and received on.
pub const MULTICAST_PORT: u16 = 5324;

/// Upper bound on one encoded announcement, trailing newline included.
/// Stays under common link MTUs so a datagram is never fragmented.
pub const MAX_MESSAGE_SIZE: usize = 1400;

/// How long a peer keeps a registration alive after the last announcement.
pub const REGISTRATION_LIFESPAN_SECS: u64 = 90;

/// How often owned registrations are re-announced.
pub const RESEND_INTERVAL_SECS: u64 = 30;

/// How often expired remote registrations are swept.
pub const CLEANUP_INTERVAL_SECS: u64 = REGISTRATION_LIFESPAN_SECS;

// At least two resends must land inside one lifespan so a single lost
// datagram never expires a live registration.
const_assert!(RESEND_INTERVAL_SECS * 3 <= REGISTRATION_LIFESPAN_SECS);

// ── Announcement ──────────────────────────────────────────────────────────────

/// One service advertisement as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Discovery key. Peers group registrations by this name.
    #[serde(rename = "ApiName")]
    pub name: String,

    #[serde(rename = "ApiVersion")]
    pub version: String,

    /// Port the service listens on. Authoritative over the UDP source port.
    #[serde(rename = "ApiPort")]
    pub port: u16,

    /// Promised lifespan in nanoseconds.
    #[serde(rename = "LifeSpan")]
    pub lifespan_nanos: u64,
}

impl Announcement {
    pub fn new(name: &str, version: &str, port: u16, lifespan: Duration) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            port,
            lifespan_nanos: u64::try_from(lifespan.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// The lifespan the sender promised to honor.
    pub fn lifespan(&self) -> Duration {
        Duration::from_nanos(self.lifespan_nanos)
    }

    /// Encode into a single datagram.
    ///
    /// Fails with [`WireError::MessageTooLarge`] rather than truncating when
    /// the result would exceed [`MAX_MESSAGE_SIZE`].
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut out = Vec::with_capacity(MAX_MESSAGE_SIZE);
        serde_json::to_writer(&mut out, self).map_err(|e| WireError::Encode(e.to_string()))?;
        out.push(b'\n');

        if out.len() > MAX_MESSAGE_SIZE {
            return Err(WireError::MessageTooLarge {
                name: self.name.clone(),
                version: self.version.clone(),
                size: out.len(),
            });
        }
        Ok(out)
    }

    /// Decode one received datagram.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(|e| WireError::Decode(e.to_string()))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when producing or interpreting an announcement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("announcement for {name} {version} is {size} bytes, exceeds maximum {}", MAX_MESSAGE_SIZE)]
    MessageTooLarge {
        name: String,
        version: String,
        size: usize,
    },

    #[error("failed to encode announcement: {0}")]
    Encode(String),

    #[error("malformed announcement: {0}")]
    Decode(String),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
