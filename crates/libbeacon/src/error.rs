//! Errors reported to callers of the registry.

use beacon_core::wire::WireError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Empty name or version. Nothing was sent or recorded.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Encoded announcement exceeds the datagram limit. Nothing was sent.
    #[error("announcement for {name} {version} is {size} bytes, exceeds maximum {}", beacon_core::wire::MAX_MESSAGE_SIZE)]
    MessageTooLarge {
        name: String,
        version: String,
        size: usize,
    },

    #[error("failed to send announcement: {0}")]
    NetworkSend(#[from] std::io::Error),

    #[error("failed to encode announcement: {0}")]
    Encode(String),
}

impl From<WireError> for RegistryError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::MessageTooLarge {
                name,
                version,
                size,
            } => RegistryError::MessageTooLarge {
                name,
                version,
                size,
            },
            WireError::Encode(msg) | WireError::Decode(msg) => RegistryError::Encode(msg),
        }
    }
}
