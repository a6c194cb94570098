//! Polling a memory region until it changes.

use bytes::Bytes;
use geckolog_client::{ClientError, MemoryLink, Sleeper};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Default pause between polls of the stats block.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Default poll budget: half an hour at the default interval.
pub const DEFAULT_MAX_POLLS: u32 = 360;

/// Poll pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub interval: Duration,
    /// `None` polls until the region changes or the match ends.
    pub max_polls: Option<u32>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_polls: Some(DEFAULT_MAX_POLLS),
        }
    }
}

/// Probe telling whether the match being watched is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Never reports the match as gone.
    Always,
    /// Alive while the 16-bit scene id slot at `address` holds `scene`.
    Scene { address: u32, scene: u16 },
}

impl Liveness {
    pub async fn is_alive<L: MemoryLink>(&self, link: &mut L) -> Result<bool, ClientError> {
        match *self {
            Liveness::Always => Ok(true),
            Liveness::Scene { address, scene } => Ok(link.peek16(address).await? == scene),
        }
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The region changed; carries the new contents.
    Changed(Bytes),
    /// The liveness probe reported the match gone first.
    Disconnected,
    /// The poll budget ran out.
    TimedOut,
    /// Shutdown was requested.
    Cancelled,
}

/// Polls memory regions at the configured pace until they change, the
/// match ends, the budget runs out or shutdown is requested.
pub struct Watcher<'a, S> {
    config: &'a WatchConfig,
    sleeper: &'a S,
    shutdown: &'a Shutdown,
}

impl<'a, S: Sleeper> Watcher<'a, S> {
    pub fn new(config: &'a WatchConfig, sleeper: &'a S, shutdown: &'a Shutdown) -> Self {
        Self {
            config,
            sleeper,
            shutdown,
        }
    }

    /// Re-reads `[address, address + length)` until it differs from `baseline`.
    ///
    /// The region is read before each sleep, so a change already present on
    /// the first read is reported without waiting.
    pub async fn wait_for_change<L: MemoryLink>(
        &self,
        link: &mut L,
        address: u32,
        length: u32,
        baseline: &[u8],
        liveness: &Liveness,
    ) -> Result<WatchOutcome, ClientError> {
        let mut polls = 0u32;

        loop {
            if self.shutdown.is_triggered() {
                return Ok(WatchOutcome::Cancelled);
            }

            let current = link.read_bytes(address, length).await?;
            if current[..] != *baseline {
                tracing::debug!("Region at {:#010X} changed after {} polls", address, polls);
                return Ok(WatchOutcome::Changed(current));
            }

            if !liveness.is_alive(link).await? {
                tracing::info!("Match ended before the region at {:#010X} changed", address);
                return Ok(WatchOutcome::Disconnected);
            }

            if self.config.max_polls.is_some_and(|max| polls >= max) {
                tracing::warn!("Gave up waiting for {:#010X} after {} polls", address, polls);
                return Ok(WatchOutcome::TimedOut);
            }

            self.sleeper.sleep(self.config.interval).await;
            polls += 1;
        }
    }
}

#[derive(Debug, Default)]
struct ShutdownInner {
    flag: AtomicBool,
    notify: Notify,
}

/// Cooperative shutdown flag shared between the signal handler and the
/// polling loops.
///
/// Sleeping through a `Shutdown` returns early once it is triggered.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown and wakes a pending sleep.
    pub fn trigger(&self) {
        self.inner.flag.store(true, Ordering::Relaxed);
        self.inner.notify.notify_one();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::Relaxed)
    }
}

impl Sleeper for Shutdown {
    async fn sleep(&self, duration: Duration) {
        if self.is_triggered() {
            return;
        }
        tokio::select! {
            _ = self.inner.notify.notified() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}
