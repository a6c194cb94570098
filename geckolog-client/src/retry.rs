//! Bounded retry with fixed backoff.
//!
//! The links never retry on their own. Drivers wrap a unit of work in a
//! [`Retry`] state machine: each failure either schedules another attempt
//! after the backoff or exhausts the budget. Sleeping goes through a
//! [`Sleeper`] so tests can run without real delays.

use std::fmt;
use std::time::Duration;

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);

/// Retry budget and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Starts a fresh state machine for one unit of work.
    pub fn start(&self) -> Retry {
        Retry {
            policy: *self,
            state: RetryState::Attempting { attempt: 1 },
        }
    }
}

/// State of one retried unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// The given attempt is (about to be) in flight.
    Attempting { attempt: u32 },
    /// The work succeeded on the given attempt.
    Succeeded { attempts: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
}

/// Attempt counter driving [`RetryState`] transitions.
#[derive(Debug, Clone)]
pub struct Retry {
    policy: RetryPolicy,
    state: RetryState,
}

impl Retry {
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        match self.state {
            RetryState::Attempting { attempt } => attempt,
            RetryState::Succeeded { attempts } | RetryState::Exhausted { attempts } => attempts,
        }
    }

    /// Records a success.
    pub fn succeed(&mut self) -> RetryState {
        self.state = RetryState::Succeeded {
            attempts: self.attempt(),
        };
        self.state
    }

    /// Records a failure and returns the next state.
    pub fn fail(&mut self) -> RetryState {
        self.state = match self.state {
            RetryState::Attempting { attempt } if attempt < self.policy.max_attempts => {
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
            _ => RetryState::Exhausted {
                attempts: self.attempt(),
            },
        };
        self.state
    }

    /// Records a failed attempt and waits out the backoff if another attempt
    /// remains.
    ///
    /// Returns `false` once the budget is spent. No sleep follows the final
    /// attempt.
    pub async fn backoff_after<E, S>(&mut self, error: &E, sleeper: &S) -> bool
    where
        E: fmt::Display,
        S: Sleeper,
    {
        let attempt = self.attempt();
        match self.fail() {
            RetryState::Attempting { .. } => {
                tracing::warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    self.policy.max_attempts,
                    error,
                    self.policy.backoff
                );
                sleeper.sleep(self.policy.backoff).await;
                true
            }
            _ => {
                tracing::error!("Failed after {} attempts: {}", attempt, error);
                false
            }
        }
    }
}

/// Source of delays between attempts and polls.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}
