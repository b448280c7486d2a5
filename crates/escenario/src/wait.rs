//! Wait policies and bounded polling.
//!
//! Every blocking wait in Escenario goes through [`Waiter::until`]: the probe
//! runs immediately, then every `poll_interval_ms`, and a final time at the
//! deadline. There is no single-shot check and no unbounded wait.
//!
//! Time is measured with `tokio::time`, so tests can run with a paused clock.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::result::{EscenarioError, EscenarioResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (15 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 15_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Timeout used for URL waits after a form submit (10 seconds)
pub const NAVIGATION_TIMEOUT_MS: u64 = 10_000;

/// Timeout for short, local waits such as a visibility check after scrolling
pub const SHORT_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// WAIT POLICY
// =============================================================================

/// Timeout and poll interval governing one blocking wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWaitPolicy", into = "RawWaitPolicy")]
pub struct WaitPolicy {
    timeout_ms: u64,
    poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RawWaitPolicy {
    timeout_ms: u64,
    poll_interval_ms: u64,
}

impl Default for RawWaitPolicy {
    fn default() -> Self {
        let p = WaitPolicy::default();
        Self {
            timeout_ms: p.timeout_ms,
            poll_interval_ms: p.poll_interval_ms,
        }
    }
}

impl TryFrom<RawWaitPolicy> for WaitPolicy {
    type Error = EscenarioError;

    fn try_from(raw: RawWaitPolicy) -> Result<Self, Self::Error> {
        Self::try_new(raw.timeout_ms, raw.poll_interval_ms)
    }
}

impl From<WaitPolicy> for RawWaitPolicy {
    fn from(p: WaitPolicy) -> Self {
        Self {
            timeout_ms: p.timeout_ms,
            poll_interval_ms: p.poll_interval_ms,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy, rejecting zero values
    ///
    /// A poll interval longer than the timeout is clamped to the timeout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either value is zero.
    pub fn try_new(timeout_ms: u64, poll_interval_ms: u64) -> EscenarioResult<Self> {
        if timeout_ms == 0 {
            return Err(EscenarioError::config("wait timeout_ms must be > 0"));
        }
        if poll_interval_ms == 0 {
            return Err(EscenarioError::config("wait poll_interval_ms must be > 0"));
        }
        Ok(Self {
            timeout_ms,
            poll_interval_ms: poll_interval_ms.min(timeout_ms),
        })
    }

    /// Policy for URL waits after submitting a form
    #[must_use]
    pub fn navigation() -> Self {
        Self::default().with_timeout(NAVIGATION_TIMEOUT_MS)
    }

    /// Policy for short local waits
    #[must_use]
    pub fn short() -> Self {
        Self::default().with_timeout(SHORT_TIMEOUT_MS)
    }

    /// Set timeout in milliseconds (zero is raised to 1)
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self.poll_interval_ms = self.poll_interval_ms.min(self.timeout_ms);
        self
    }

    /// Set polling interval in milliseconds (zero is raised to 1)
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1).min(self.timeout_ms);
        self
    }

    /// Timeout in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Poll interval in milliseconds
    #[must_use]
    pub const fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Outcome of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult<T> {
    /// The probe produced a value before the deadline
    Satisfied {
        /// Value produced by the probe
        value: T,
        /// Time since the waiter started
        elapsed: Duration,
        /// Number of probe calls in this wait
        attempts: u32,
    },
    /// The deadline passed without the probe producing a value
    TimedOut {
        /// Time since the waiter started
        elapsed: Duration,
        /// Number of probe calls in this wait
        attempts: u32,
    },
}

impl<T> WaitResult<T> {
    /// Whether the wait succeeded
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    /// Number of probe calls
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Satisfied { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Extract the value, or `None` on timeout
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Satisfied { value, .. } => Some(value),
            Self::TimedOut { .. } => None,
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// A running wait with a fixed deadline.
///
/// Several [`until`](Self::until) calls on one waiter share the same
/// deadline, which is how two-phase waits (present, then visible) stay
/// within a single timeout.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    policy: WaitPolicy,
    started: Instant,
    deadline: Instant,
}

impl Waiter {
    /// Start the clock for `policy`
    #[must_use]
    pub fn start(policy: WaitPolicy) -> Self {
        let started = Instant::now();
        Self {
            policy,
            started,
            deadline: started + policy.timeout(),
        }
    }

    /// Policy this waiter was started with
    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Time since the waiter started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the deadline has passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Poll `probe` until it yields `Some` or the deadline passes.
    ///
    /// Errors returned by the probe abort the wait and are propagated as-is.
    pub async fn until<T, F, Fut>(&self, mut probe: F) -> EscenarioResult<WaitResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EscenarioResult<Option<T>>>,
    {
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            if let Some(value) = probe().await? {
                return Ok(WaitResult::Satisfied {
                    value,
                    elapsed: self.elapsed(),
                    attempts,
                });
            }

            let now = Instant::now();
            if now >= self.deadline {
                tracing::debug!(attempts, elapsed_ms = self.elapsed().as_millis() as u64, "wait timed out");
                return Ok(WaitResult::TimedOut {
                    elapsed: self.elapsed(),
                    attempts,
                });
            }
            let nap = self.policy.poll_interval().min(self.deadline - now);
            tokio::time::sleep(nap).await;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
