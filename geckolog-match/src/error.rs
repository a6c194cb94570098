//! Driver error types.

use crate::config::ConfigError;
use geckolog_client::ClientError;
use thiserror::Error;

/// Errors raised while capturing or logging a match.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("name table error: {0}")]
    Names(#[from] serde_json::Error),

    #[error("player record too short: {0} bytes")]
    ShortRecord(usize),

    #[error("cancelled")]
    Cancelled,

    #[error("failed after {attempts} tries: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<MatchError>,
    },
}

impl MatchError {
    /// Returns whether repeating the work may succeed.
    ///
    /// Every client error qualifies: game pointers are null or stale while
    /// scenes load, so even a range rejection can clear up on a later try.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::Client(_))
    }

    /// Returns whether the link's stream position is unknown after this error.
    pub fn breaks_link(&self) -> bool {
        matches!(self, MatchError::Client(e) if !e.is_policy())
    }
}
