//! Forward bid schedules produced by dispatch strategists.

use types::{TimePeriod, TimeStamp};

/// Maximum deviation between the expected and the actual initial storage
/// energy for a schedule to remain applicable.
pub const MAX_SCHEDULE_ENERGY_DEVIATION_IN_MWH: f64 = 1e-3;

/// A forward plan of (energy, price) pairs per hour for a flexible device.
///
/// Schedules are immutable once built. A trader reuses a schedule as long as
/// it is applicable to the next clearing time and otherwise requests a fresh
/// one from its strategist.
#[derive(Debug, Clone, PartialEq)]
pub struct BidSchedule {
    period: TimePeriod,
    requested_energy_per_period_in_mwh: Vec<f64>,
    bid_price_per_period_in_eur_per_mwh: Vec<f64>,
    expected_initial_internal_energy_per_period_in_mwh: Vec<f64>,
}

impl BidSchedule {
    /// Builds a schedule starting at `period` with one entry per period.
    ///
    /// # Panics
    /// Panics if the three series differ in length — a strategist bug.
    pub fn new(
        period: TimePeriod,
        requested_energy_per_period_in_mwh: Vec<f64>,
        bid_price_per_period_in_eur_per_mwh: Vec<f64>,
        expected_initial_internal_energy_per_period_in_mwh: Vec<f64>,
    ) -> Self {
        assert_eq!(
            requested_energy_per_period_in_mwh.len(),
            bid_price_per_period_in_eur_per_mwh.len()
        );
        assert_eq!(
            requested_energy_per_period_in_mwh.len(),
            expected_initial_internal_energy_per_period_in_mwh.len()
        );
        Self {
            period,
            requested_energy_per_period_in_mwh,
            bid_price_per_period_in_eur_per_mwh,
            expected_initial_internal_energy_per_period_in_mwh,
        }
    }

    /// Number of covered periods.
    pub fn duration_in_periods(&self) -> usize {
        self.requested_energy_per_period_in_mwh.len()
    }

    /// Index of the period containing `time`, if inside the covered window.
    fn period_index(&self, time: TimeStamp) -> Option<usize> {
        let start = self.period.start_time();
        if time < start {
            return None;
        }
        let index = ((time.step() - start.step()) / self.period.duration().ticks()) as usize;
        (index < self.duration_in_periods()).then_some(index)
    }

    /// True if `time` is covered and the device's actual energy matches the
    /// scheduled trajectory within tolerance.
    pub fn is_applicable(&self, time: TimeStamp, current_internal_energy_in_mwh: f64) -> bool {
        match self.period_index(time) {
            Some(index) => {
                let expected = self.expected_initial_internal_energy_per_period_in_mwh[index];
                (expected - current_internal_energy_in_mwh).abs()
                    <= MAX_SCHEDULE_ENERGY_DEVIATION_IN_MWH
            }
            None => false,
        }
    }

    /// Scheduled external energy for the period containing `time`; zero
    /// outside the covered window.
    pub fn requested_energy_for(&self, time: TimeStamp) -> f64 {
        self.period_index(time)
            .map(|index| self.requested_energy_per_period_in_mwh[index])
            .unwrap_or(0.0)
    }

    /// Scheduled bid price for the period containing `time`; NaN outside the
    /// covered window.
    pub fn bid_price_for(&self, time: TimeStamp) -> f64 {
        self.period_index(time)
            .map(|index| self.bid_price_per_period_in_eur_per_mwh[index])
            .unwrap_or(f64::NAN)
    }

    /// Expected internal energy at the start of the period containing `time`.
    pub fn expected_initial_energy_for(&self, time: TimeStamp) -> Option<f64> {
        self.period_index(time)
            .map(|index| self.expected_initial_internal_energy_per_period_in_mwh[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::TimeSpan;

    fn schedule() -> BidSchedule {
        BidSchedule::new(
            TimePeriod::hour_starting_at(TimeStamp::from_hours(10)),
            vec![1.0, -1.0, 0.0],
            vec![3000.0, -500.0, f64::NAN],
            vec![0.0, 1.0, 0.0],
        )
    }

    #[test]
    fn test_window_coverage() {
        let s = schedule();
        assert!(s.is_applicable(TimeStamp::from_hours(10), 0.0));
        assert!(s.is_applicable(TimeStamp::from_hours(12), 0.0));
        assert!(!s.is_applicable(TimeStamp::from_hours(13), 0.0));
        assert!(!s.is_applicable(TimeStamp::from_hours(9), 0.0));
    }

    #[test]
    fn test_energy_mismatch_invalidates() {
        let s = schedule();
        assert!(s.is_applicable(TimeStamp::from_hours(11), 1.0));
        assert!(!s.is_applicable(TimeStamp::from_hours(11), 1.5));
        // Deviation within tolerance keeps the schedule alive.
        assert!(s.is_applicable(TimeStamp::from_hours(11), 1.0005));
    }

    #[test]
    fn test_lookup_by_time() {
        let s = schedule();
        assert_eq!(s.requested_energy_for(TimeStamp::from_hours(10)), 1.0);
        assert_eq!(s.requested_energy_for(TimeStamp::from_hours(11)), -1.0);
        assert_eq!(s.bid_price_for(TimeStamp::from_hours(10)), 3000.0);
        assert_eq!(s.bid_price_for(TimeStamp::from_hours(11)), -500.0);
        // Mid-period stamps resolve to the containing period.
        let mid_period = TimeStamp::from_hours(10).later_by(TimeSpan(1800));
        assert_eq!(s.requested_energy_for(mid_period), 1.0);
        // Outside the window nothing is scheduled.
        assert_eq!(s.requested_energy_for(TimeStamp::from_hours(20)), 0.0);
        assert!(s.bid_price_for(TimeStamp::from_hours(20)).is_nan());
    }
}
