//! Time-series capability consumed by forecasters and file dispatchers.

use crate::time::TimeStamp;

/// A scalar series over simulation time.
///
/// Queries outside the covered range clamp to the nearest sample, so a
/// series is effectively step-extended at both ends.
pub trait TimeSeries {
    /// Value at `time`, linearly interpolated between surrounding samples.
    fn value_linear(&self, time: TimeStamp) -> f64;

    /// Value of the latest sample at or before `time` (step-hold).
    fn value_earlier_equal(&self, time: TimeStamp) -> f64;

    /// Value of the earliest sample at or after `time`.
    fn value_later_equal(&self, time: TimeStamp) -> f64;
}

/// A time series backed by a sorted in-memory table of samples.
#[derive(Debug, Clone)]
pub struct InMemoryTimeSeries {
    points: Vec<(TimeStamp, f64)>,
}

impl InMemoryTimeSeries {
    /// Creates a series from samples; samples are sorted by time.
    ///
    /// # Panics
    /// Panics if `points` is empty — an empty series has no value anywhere.
    pub fn new(mut points: Vec<(TimeStamp, f64)>) -> Self {
        assert!(!points.is_empty(), "time series requires at least one sample");
        points.sort_by_key(|(t, _)| *t);
        Self { points }
    }

    /// Series holding the same value at all times.
    pub fn constant(value: f64) -> Self {
        Self {
            points: vec![(TimeStamp::ZERO, value)],
        }
    }

    /// Series with one sample per hour starting at the origin.
    pub fn from_hourly(values: &[f64]) -> Self {
        Self::new(
            values
                .iter()
                .enumerate()
                .map(|(hour, &value)| (TimeStamp::from_hours(hour as u64), value))
                .collect(),
        )
    }

    /// Index of the latest sample at or before `time`, if any.
    fn index_earlier_equal(&self, time: TimeStamp) -> Option<usize> {
        match self.points.binary_search_by_key(&time, |(t, _)| *t) {
            Ok(idx) => Some(idx),
            Err(0) => None,
            Err(idx) => Some(idx - 1),
        }
    }
}

impl TimeSeries for InMemoryTimeSeries {
    fn value_linear(&self, time: TimeStamp) -> f64 {
        let Some(lower) = self.index_earlier_equal(time) else {
            return self.points[0].1;
        };
        if lower + 1 >= self.points.len() {
            return self.points[lower].1;
        }
        let (t0, v0) = self.points[lower];
        let (t1, v1) = self.points[lower + 1];
        let fraction = (time.step() - t0.step()) as f64 / (t1.step() - t0.step()) as f64;
        v0 + fraction * (v1 - v0)
    }

    fn value_earlier_equal(&self, time: TimeStamp) -> f64 {
        match self.index_earlier_equal(time) {
            Some(idx) => self.points[idx].1,
            None => self.points[0].1,
        }
    }

    fn value_later_equal(&self, time: TimeStamp) -> f64 {
        match self.points.iter().find(|(t, _)| *t >= time) {
            Some((_, value)) => *value,
            None => self.points[self.points.len() - 1].1,
        }
    }
}
