//! Dispatch-from-file strategist: bypasses optimisation and replays a
//! relative charging series.

use devices::Device;
use tracing::warn;
use types::{InMemoryTimeSeries, PriceBounds, TimePeriod, TimeSeries, OPERATION_PERIOD_IN_HOURS};

use crate::error::Result;
use crate::schedule::BidSchedule;
use crate::strategist::Strategist;

/// Default accepted tolerance for dispatch deviations in MWh.
pub const DEFAULT_DISPATCH_TOLERANCE_IN_MWH: f64 = 0.1;

/// Replays a charging series `x(t) in [-1, 1]` relative to the device's
/// installed power.
///
/// The prescribed trajectory is clamped to the device's energy bounds; a
/// prescription that would leave them by more than the tolerance marks the
/// file as unsuitable for the configured device and is logged. Bids are
/// priced at the hard limits so the replayed dispatch always clears. This
/// strategist cannot digest forecasts.
pub struct FileDispatcher {
    schedule_series: InMemoryTimeSeries,
    dispatch_tolerance_in_mwh: f64,
    schedule_duration_in_periods: usize,
    bounds: PriceBounds,
}

impl FileDispatcher {
    pub fn new(
        schedule_series: InMemoryTimeSeries,
        dispatch_tolerance_in_mwh: f64,
        schedule_duration_in_periods: usize,
        bounds: PriceBounds,
    ) -> Self {
        Self {
            schedule_series,
            dispatch_tolerance_in_mwh,
            schedule_duration_in_periods,
            bounds,
        }
    }

    /// Internal energy delta prescribed for one period.
    ///
    /// Positive values charge through the charging branch, negative values
    /// drain through the discharging branch, each scaled so the external
    /// exchange stays within the installed power.
    fn prescribed_internal_delta(&self, device: &Device, relative_charge_power: f64) -> f64 {
        let hours = OPERATION_PERIOD_IN_HOURS;
        if relative_charge_power >= 0.0 {
            device.installed_power_in_mw() * hours * device.charging_efficiency() * relative_charge_power
        } else {
            device.installed_power_in_mw() * hours * relative_charge_power
        }
    }
}

impl Strategist for FileDispatcher {
    fn plan(&mut self, start: TimePeriod, device: &Device) -> Result<BidSchedule> {
        let capacity = device.energy_storage_capacity_in_mwh();
        let mut requested_energy = Vec::with_capacity(self.schedule_duration_in_periods);
        let mut bid_prices = Vec::with_capacity(self.schedule_duration_in_periods);
        let mut initial_energies = Vec::with_capacity(self.schedule_duration_in_periods);

        let mut energy_in_mwh = device.energy_in_storage_in_mwh();
        for element in 0..self.schedule_duration_in_periods {
            let planning_time = start.shift_by_duration(element as u64).start_time();
            let relative = self.schedule_series.value_linear(planning_time);
            let internal_delta = self.prescribed_internal_delta(device, relative);

            let unclamped_next = energy_in_mwh + internal_delta;
            if unclamped_next < -self.dispatch_tolerance_in_mwh {
                warn!(
                    time = %planning_time,
                    "dispatch file not suitable: storage below tolerance by more than {} MWh",
                    self.dispatch_tolerance_in_mwh
                );
            }
            if unclamped_next > capacity + self.dispatch_tolerance_in_mwh {
                warn!(
                    time = %planning_time,
                    "dispatch file not suitable: storage above tolerance by more than {} MWh",
                    self.dispatch_tolerance_in_mwh
                );
            }

            let next_energy = unclamped_next.clamp(0.0, capacity);
            let realised_internal = next_energy - energy_in_mwh;
            let external = device.internal_to_external_energy(realised_internal);

            requested_energy.push(external);
            initial_energies.push(energy_in_mwh);
            bid_prices.push(if external > 0.0 {
                self.bounds.scarcity_price_in_eur_per_mwh
            } else if external < 0.0 {
                self.bounds.minimal_price_in_eur_per_mwh
            } else {
                0.0
            });
            energy_in_mwh = next_energy;
        }

        Ok(BidSchedule::new(
            start,
            requested_energy,
            bid_prices,
            initial_energies,
        ))
    }
}
