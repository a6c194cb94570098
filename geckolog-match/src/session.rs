//! Reconnecting session with bounded retries.
//!
//! The links never reconnect. A [`Session`] owns at most one link, opens it
//! on first use and drops it after any wire or transport error, because the
//! stream position is unknown at that point. The next attempt of
//! [`Session::retrying`] connects afresh. Range rejections are retried on
//! the same link; they never reach the socket.

use crate::error::MatchError;
use geckolog_client::{connect, AnyLink, ClientError, ConnectionConfig, MemoryLink, RetryPolicy, Sleeper};

/// Opens new links.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Link: MemoryLink;

    async fn connect(&self) -> Result<Self::Link, ClientError>;
}

/// Connects over TCP with the variant chosen in the config.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ConnectionConfig,
}

impl TcpConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl Connector for TcpConnector {
    type Link = AnyLink;

    async fn connect(&self) -> Result<AnyLink, ClientError> {
        connect(&self.config).await
    }
}

/// A unit of driver work run against one link.
///
/// On failure the whole unit is repeated on a new connection, so
/// implementations must not keep partial results between runs.
#[allow(async_fn_in_trait)]
pub trait Work<L: MemoryLink> {
    type Output;

    async fn run(&mut self, link: &mut L) -> Result<Self::Output, MatchError>;
}

/// Owns the current link and the retry policy.
pub struct Session<C: Connector> {
    connector: C,
    link: Option<C::Link>,
    policy: RetryPolicy,
    connects: u32,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            link: None,
            policy,
            connects: 0,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of connections opened so far.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Returns the current link, connecting first if there is none.
    pub async fn link(&mut self) -> Result<&mut C::Link, ClientError> {
        if self.link.is_none() {
            let link = self.connector.connect().await?;
            self.connects += 1;
            tracing::info!("Connected ({} link)", link.variant());
            self.link = Some(link);
        }
        self.link.as_mut().ok_or(ClientError::NotConnected)
    }

    /// Drops the current link.
    pub fn reset(&mut self) {
        if self.link.take().is_some() {
            tracing::debug!("Dropped link");
        }
    }

    /// Runs `work` until it succeeds, a non-retryable error occurs, or the
    /// retry budget is spent.
    pub async fn retrying<W, S>(&mut self, work: &mut W, sleeper: &S) -> Result<W::Output, MatchError>
    where
        W: Work<C::Link>,
        S: Sleeper,
    {
        let mut retry = self.policy.start();

        loop {
            let result = match self.link().await {
                Ok(link) => work.run(link).await,
                Err(e) => Err(e.into()),
            };

            let e = match result {
                Ok(output) => {
                    retry.succeed();
                    return Ok(output);
                }
                Err(e) => e,
            };

            if !e.is_retryable() {
                return Err(e);
            }
            if e.breaks_link() {
                self.reset();
            }

            if !retry.backoff_after(&e, sleeper).await {
                return Err(MatchError::RetriesExhausted {
                    attempts: retry.attempt(),
                    last: Box::new(e),
                });
            }
        }
    }
}
