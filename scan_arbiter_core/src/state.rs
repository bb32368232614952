use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Instant on the caller's monotonic clock, in whole nanoseconds.
///
/// Host clocks that report fractional seconds are converted once, at the
/// edge, with `from_secs_f64`; every interval comparison after that is exact
/// integer arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        Timestamp(nanos)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp(millis.saturating_mul(1_000_000))
    }

    /// Round host seconds to the nearest nanosecond.
    ///
    /// `None` for NaN, infinities and values outside the `i64` nanosecond range.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() {
            return None;
        }
        let nanos = (secs * NANOS_PER_SEC).round();
        if nanos < i64::MIN as f64 || nanos >= i64::MAX as f64 {
            return None;
        }
        Some(Timestamp(nanos as i64))
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Signed distance from `earlier` to `self`. Negative when the caller's
    /// clock went backwards.
    #[inline]
    pub fn nanos_since(self, earlier: Timestamp) -> i128 {
        self.0 as i128 - earlier.0 as i128
    }

    pub fn saturating_add(self, d: Duration) -> Self {
        let nanos = i64::try_from(d.as_nanos()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

/// Decision bookkeeping for one scanning session.
///
/// `last_emit_at == None` is the "far past" sentinel: every interval check
/// against it reads as infinitely long ago.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct ArbiterState<T> {
    pub accepted_values: HashSet<T>,
    pub finished: bool,
    pub last_emit_at: Option<Timestamp>,
}

impl<T> Default for ArbiterState<T> {
    fn default() -> Self {
        Self {
            accepted_values: HashSet::new(),
            finished: false,
            last_emit_at: None,
        }
    }
}

impl<T: Eq + Hash> PartialEq for ArbiterState<T> {
    fn eq(&self, other: &Self) -> bool {
        self.finished == other.finished
            && self.last_emit_at == other.last_emit_at
            && self.accepted_values == other.accepted_values
    }
}

impl<T: Eq + Hash> ArbiterState<T> {
    #[inline]
    pub fn reset(&mut self) {
        self.accepted_values.clear();
        self.finished = false;
        self.last_emit_at = None;
    }

    /// Nanoseconds since the last emission, `None` when still at the sentinel.
    #[inline]
    pub fn elapsed_since_emit(&self, now: Timestamp) -> Option<i128> {
        self.last_emit_at.map(|t| now.nanos_since(t))
    }
}
