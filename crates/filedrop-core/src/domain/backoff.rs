//! Time-windowed linear reconnect backoff.
//!
//! Every time the transport's connection closes, the close instant is
//! recorded.  Closes older than the window (five minutes) are forgotten, and
//! the delay before the next reconnect attempt is
//!
//! ```text
//! delay = min(max_backoff, base_unit × closes_in_window)
//! ```
//!
//! The window equals the cap, so a connection that stays up for five
//! minutes has its close count, and therefore its delay, reset to the minimum.
//!
//! History is pruned only when a close is recorded, never continuously.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Delay added per close recorded inside the window.
pub const DEFAULT_BASE_UNIT: Duration = Duration::from_millis(600);

/// Upper bound on any single reconnect delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(300_000);

/// How long a close keeps counting towards the delay.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Parameters of the linear, capped backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_unit: Duration,
    max_backoff: Duration,
    window: Duration,
}

impl BackoffPolicy {
    pub fn new(base_unit: Duration, max_backoff: Duration, window: Duration) -> Self {
        Self {
            base_unit,
            max_backoff,
            window,
        }
    }

    pub fn base_unit(&self) -> Duration {
        self.base_unit
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Delay for a history containing `closes` recent close events.
    pub fn delay_for_closes(&self, closes: usize) -> Duration {
        let closes = u32::try_from(closes).unwrap_or(u32::MAX);
        self.base_unit
            .checked_mul(closes)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_UNIT, DEFAULT_MAX_BACKOFF, DEFAULT_WINDOW)
    }
}

/// Rolling record of recent connection close instants.
///
/// Instants are kept in arrival order, so pruning only ever pops from the
/// front.
#[derive(Debug, Clone, Default)]
pub struct CloseHistory {
    policy: BackoffPolicy,
    closes: VecDeque<Instant>,
}

impl CloseHistory {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            closes: VecDeque::new(),
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Number of closes currently held.
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Records a close at `now` and returns the delay before reconnecting.
    ///
    /// Closes that happened a full window or more before `now` are pruned
    /// first, then `now` is appended, then the delay is computed from the
    /// resulting count.
    pub fn record_close(&mut self, now: Instant) -> Duration {
        while let Some(&oldest) = self.closes.front() {
            if now.saturating_duration_since(oldest) < self.policy.window {
                break;
            }
            self.closes.pop_front();
        }
        self.closes.push_back(now);
        self.retry_delay()
    }

    /// Delay derived from the current history, without recording anything.
    pub fn retry_delay(&self) -> Duration {
        self.policy.delay_for_closes(self.closes.len())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
