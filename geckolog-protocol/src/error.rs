//! Protocol error types.

use crate::address::Access;
use thiserror::Error;

/// Protocol-level errors raised while validating or decoding an exchange.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("reading memory requires a non-zero length")]
    InvalidLength,

    #[error("address {address:#010X} (+{length:#x}) is outside the valid range")]
    OutOfRange { address: u32, length: u32 },

    #[error("{access} access not permitted at {address:#010X} (+{length:#x})")]
    AccessDenied {
        address: u32,
        length: u32,
        access: Access,
    },

    #[error("unable to read memory: unexpected status byte {0:#04x}")]
    UnexpectedStatus(u8),

    #[error("malformed reply: {0:?}")]
    MalformedReply(String),

    #[error("invalid UTF-8 in reply")]
    InvalidUtf8,
}

impl ProtocolError {
    /// Returns whether the request was rejected by the address-space policy,
    /// i.e. before anything reached the socket.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidLength
                | ProtocolError::OutOfRange { .. }
                | ProtocolError::AccessDenied { .. }
        )
    }
}
