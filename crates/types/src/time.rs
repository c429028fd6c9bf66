//! Simulation time: monotonic tick counts and hourly trading periods.
//!
//! The simulation advances in discrete ticks at a fixed base resolution of
//! one second. Market operations happen on a coarser grid of one-hour
//! periods; `OPERATION_PERIOD` is the span of one such period.

use std::fmt;

use derive_more::{Add, AddAssign, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};

/// Base-resolution ticks per hour of simulated time.
pub const TICKS_PER_HOUR: u64 = 3600;

/// Length of one market operation period in hours.
pub const OPERATION_PERIOD_IN_HOURS: f64 = 1.0;

/// Span of one market operation period in ticks.
pub const OPERATION_PERIOD: TimeSpan = TimeSpan(TICKS_PER_HOUR);

/// Opaque monotonic step count at the base resolution.
///
/// Supports tick arithmetic and comparison; the zero stamp is the start of
/// the simulated horizon.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TimeStamp(pub u64);

impl TimeStamp {
    pub const ZERO: TimeStamp = TimeStamp(0);

    /// Stamp at the given number of whole hours after the origin.
    pub fn from_hours(hours: u64) -> Self {
        TimeStamp(hours * TICKS_PER_HOUR)
    }

    /// Raw tick count.
    #[inline]
    pub fn step(self) -> u64 {
        self.0
    }

    /// Stamp shifted later by the given span.
    #[inline]
    pub fn later_by(self, span: TimeSpan) -> TimeStamp {
        TimeStamp(self.0 + span.0)
    }

    /// Stamp shifted earlier by the given span, saturating at the origin.
    #[inline]
    pub fn earlier_by(self, span: TimeSpan) -> TimeStamp {
        TimeStamp(self.0.saturating_sub(span.0))
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A duration in base-resolution ticks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Sum,
)]
pub struct TimeSpan(pub u64);

impl TimeSpan {
    /// Span covering the given number of whole hours.
    pub fn from_hours(hours: u64) -> Self {
        TimeSpan(hours * TICKS_PER_HOUR)
    }

    /// Raw tick count.
    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// This span repeated `factor` times.
    #[inline]
    pub fn times(self, factor: u64) -> TimeSpan {
        TimeSpan(self.0 * factor)
    }
}

/// A half-open window `[start, start + duration)` on the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimePeriod {
    start: TimeStamp,
    duration: TimeSpan,
}

impl TimePeriod {
    /// Creates a period starting at `start` and spanning `duration` ticks.
    pub fn new(start: TimeStamp, duration: TimeSpan) -> Self {
        Self { start, duration }
    }

    /// Hourly operation period beginning at `start`.
    pub fn hour_starting_at(start: TimeStamp) -> Self {
        Self::new(start, OPERATION_PERIOD)
    }

    #[inline]
    pub fn start_time(&self) -> TimeStamp {
        self.start
    }

    #[inline]
    pub fn duration(&self) -> TimeSpan {
        self.duration
    }

    /// Last tick still inside the period.
    pub fn last_time(&self) -> TimeStamp {
        TimeStamp(self.start.0 + self.duration.0 - 1)
    }

    /// A new period offset later by `periods * duration`.
    pub fn shift_by_duration(&self, periods: u64) -> TimePeriod {
        TimePeriod {
            start: self.start.later_by(self.duration.times(periods)),
            duration: self.duration,
        }
    }

    /// True if `time` falls inside this period.
    pub fn contains(&self, time: TimeStamp) -> bool {
        time >= self.start && time.0 < self.start.0 + self.duration.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_arithmetic() {
        let t = TimeStamp::from_hours(2);
        assert_eq!(t.step(), 7200);
        assert_eq!(t.later_by(TimeSpan::from_hours(1)), TimeStamp::from_hours(3));
        assert_eq!(t.earlier_by(TimeSpan::from_hours(1)), TimeStamp::from_hours(1));
        // Saturates instead of wrapping below the origin.
        assert_eq!(t.earlier_by(TimeSpan::from_hours(5)), TimeStamp::ZERO);
    }

    #[test]
    fn test_period_shift_and_containment() {
        let period = TimePeriod::hour_starting_at(TimeStamp::from_hours(4));
        let shifted = period.shift_by_duration(3);
        assert_eq!(shifted.start_time(), TimeStamp::from_hours(7));
        assert_eq!(shifted.duration(), OPERATION_PERIOD);

        assert!(period.contains(TimeStamp::from_hours(4)));
        assert!(period.contains(TimeStamp(4 * TICKS_PER_HOUR + 3599)));
        assert!(!period.contains(TimeStamp::from_hours(5)));
    }

    #[test]
    fn test_period_last_time() {
        let period = TimePeriod::hour_starting_at(TimeStamp::ZERO);
        assert_eq!(period.last_time(), TimeStamp(TICKS_PER_HOUR - 1));
    }
}
