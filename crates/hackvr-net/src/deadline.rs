//! Monotonic deadlines.
//!
//! A [`Deadline`] is an absolute nanosecond timestamp on a process-wide
//! monotonic clock. Two sentinels bound the range: [`Deadline::INSTANT`]
//! (timestamp zero, already reached; the non-blocking poll deadline) and
//! [`Deadline::NEVER`] (the maximum signed 63-bit timestamp, never
//! reached). Deadlines are plain values; they cost nothing to copy and
//! compare.

use std::{
    sync::LazyLock,
    time::{Duration, Instant},
};

use crate::error::NetError;

/// Nanosecond value of [`Deadline::NEVER`].
const NEVER_NS: u64 = (1 << 63) - 1;

/// Anchor for the process-wide monotonic nanosecond clock.
static CLOCK_START: LazyLock<Instant> = LazyLock::new(Instant::now);

fn monotonic_ns() -> u64 {
    CLOCK_START.elapsed().as_nanos() as u64
}

/// Absolute monotonic-clock deadline with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    deadline_ns: u64,
}

impl Deadline {
    /// Already reached; makes receive operations non-blocking.
    pub const INSTANT: Deadline = Deadline { deadline_ns: 0 };

    /// Never reached; receive operations block until data or EOF.
    pub const NEVER: Deadline = Deadline { deadline_ns: NEVER_NS };

    /// A deadline `duration` from now.
    ///
    /// # Errors
    ///
    /// [`NetError::Timeout`] for a zero duration; use
    /// [`Deadline::INSTANT`] for non-blocking operations instead.
    pub fn from_now(duration: Duration) -> Result<Self, NetError> {
        if duration.is_zero() {
            return Err(NetError::Timeout);
        }
        let total_ns = duration.as_nanos().min(u128::from(NEVER_NS)) as u64;
        Ok(Self { deadline_ns: monotonic_ns().saturating_add(total_ns).min(NEVER_NS) })
    }

    /// A deadline `seconds` from now; rejects zero.
    pub fn from_secs(seconds: u64) -> Result<Self, NetError> {
        Self::from_now(Duration::from_secs(seconds))
    }

    /// A deadline `millis` milliseconds from now; rejects zero.
    pub fn from_millis(millis: u64) -> Result<Self, NetError> {
        Self::from_now(Duration::from_millis(millis))
    }

    /// Nanoseconds until the deadline; zero once reached.
    #[must_use]
    pub fn remaining_ns(&self) -> u64 {
        self.deadline_ns.saturating_sub(monotonic_ns())
    }

    /// Time until the deadline as a [`Duration`]; zero once reached.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        Duration::from_nanos(self.remaining_ns())
    }

    /// Whether this is the [`Deadline::INSTANT`] sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadline_ns == 0
    }

    /// Whether this is [`Deadline::NEVER`] (or beyond).
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.deadline_ns >= NEVER_NS
    }

    /// Whether the deadline has passed. [`Deadline::INSTANT`] is always
    /// reached, [`Deadline::NEVER`] never is.
    #[must_use]
    pub fn is_reached(&self) -> bool {
        if self.is_infinite() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        monotonic_ns() >= self.deadline_ns
    }

    /// Fail with [`NetError::Timeout`] once the deadline is reached.
    pub fn check(&self) -> Result<(), NetError> {
        if self.is_reached() { Err(NetError::Timeout) } else { Ok(()) }
    }
}
