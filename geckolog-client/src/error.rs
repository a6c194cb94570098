//! Client error types.

use geckolog_protocol::ProtocolError;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,
}

impl ClientError {
    /// Returns whether the failure happened on the transport (socket or timer).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::Timeout
                | ClientError::ConnectionClosed
                | ClientError::NotConnected
        )
    }

    /// Returns whether the request was rejected before touching the socket.
    ///
    /// The stream is left untouched, so the link stays usable.
    pub fn is_policy(&self) -> bool {
        matches!(self, ClientError::Protocol(e) if e.is_policy())
    }
}
