//! Physical energy storage device (battery, pumped hydro, hydrogen buffer).
//!
//! # Energy convention
//! *External* energy is grid-side; *internal* energy is inside the tank.
//! Charging converts external to internal through the charging efficiency,
//! discharging converts internal to external through the discharging
//! efficiency:
//!
//! - charging: `internal = external * charge_eff`
//! - discharging: `external = internal * discharge_eff`
//!
//! Positive power charges, negative power discharges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use types::{TimeStamp, OPERATION_PERIOD_IN_HOURS};

use crate::error::{DeviceError, Result};

/// Design parameters of a storage device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageParameters {
    /// Hours of charging at installed power to fill the storage.
    pub energy_to_power_ratio: f64,
    /// Fraction of stored energy lost per hour.
    pub self_discharge_rate_per_hour: f64,
    /// Charging efficiency in (0, 1].
    pub charging_efficiency: f64,
    /// Discharging efficiency in (0, 1].
    pub discharging_efficiency: f64,
    /// Energy content at simulation start.
    pub initial_energy_level_in_mwh: f64,
    /// Maximum external power on both branches.
    pub installed_power_in_mw: f64,
}

impl StorageParameters {
    fn validate(&self) -> Result<()> {
        if !(self.charging_efficiency > 0.0 && self.charging_efficiency <= 1.0) {
            return Err(DeviceError::invalid(
                "ChargingEfficiency",
                self.charging_efficiency,
            ));
        }
        if !(self.discharging_efficiency > 0.0 && self.discharging_efficiency <= 1.0) {
            return Err(DeviceError::invalid(
                "DischargingEfficiency",
                self.discharging_efficiency,
            ));
        }
        if !(self.energy_to_power_ratio >= 0.0) {
            return Err(DeviceError::invalid(
                "EnergyToPowerRatio",
                self.energy_to_power_ratio,
            ));
        }
        if !(0.0..=1.0).contains(&self.self_discharge_rate_per_hour) {
            return Err(DeviceError::invalid(
                "SelfDischargeRatePerHour",
                self.self_discharge_rate_per_hour,
            ));
        }
        if !(self.installed_power_in_mw >= 0.0) {
            return Err(DeviceError::invalid(
                "InstalledPowerInMW",
                self.installed_power_in_mw,
            ));
        }
        Ok(())
    }
}

/// A storage device with mutable energy content and dispatch accounting.
#[derive(Debug, Clone)]
pub struct Device {
    charging_efficiency: f64,
    discharging_efficiency: f64,
    self_discharge_rate_per_hour: f64,
    installed_power_in_mw: f64,
    energy_storage_capacity_in_mwh: f64,
    energy_in_storage_in_mwh: f64,
    accounted_internal_flows_in_mwh: f64,
    accounted_full_storage_cycles: f64,
    discharging_deviation: BTreeMap<TimeStamp, f64>,
}

impl Device {
    /// Builds a device from validated parameters.
    ///
    /// The initial energy level is clamped into `[0, capacity]`.
    pub fn new(parameters: &StorageParameters) -> Result<Self> {
        parameters.validate()?;
        let capacity = parameters.installed_power_in_mw
            * parameters.energy_to_power_ratio
            * parameters.charging_efficiency;
        Ok(Self {
            charging_efficiency: parameters.charging_efficiency,
            discharging_efficiency: parameters.discharging_efficiency,
            self_discharge_rate_per_hour: parameters.self_discharge_rate_per_hour,
            installed_power_in_mw: parameters.installed_power_in_mw,
            energy_storage_capacity_in_mwh: capacity,
            energy_in_storage_in_mwh: parameters.initial_energy_level_in_mwh.clamp(0.0, capacity),
            accounted_internal_flows_in_mwh: 0.0,
            accounted_full_storage_cycles: 0.0,
            discharging_deviation: BTreeMap::new(),
        })
    }

    #[inline]
    pub fn energy_storage_capacity_in_mwh(&self) -> f64 {
        self.energy_storage_capacity_in_mwh
    }

    #[inline]
    pub fn energy_in_storage_in_mwh(&self) -> f64 {
        self.energy_in_storage_in_mwh
    }

    #[inline]
    pub fn installed_power_in_mw(&self) -> f64 {
        self.installed_power_in_mw
    }

    #[inline]
    pub fn charging_efficiency(&self) -> f64 {
        self.charging_efficiency
    }

    #[inline]
    pub fn discharging_efficiency(&self) -> f64 {
        self.discharging_efficiency
    }

    #[inline]
    pub fn self_discharge_rate_per_hour(&self) -> f64 {
        self.self_discharge_rate_per_hour
    }

    /// Maximum grid-side charging power.
    #[inline]
    pub fn external_charging_power_in_mw(&self) -> f64 {
        self.installed_power_in_mw
    }

    /// Maximum grid-side discharging power.
    #[inline]
    pub fn external_discharging_power_in_mw(&self) -> f64 {
        self.installed_power_in_mw
    }

    /// Converts an external energy flow to the internal flow it causes;
    /// branch chosen by sign.
    #[inline]
    pub fn external_to_internal_energy(&self, external_energy_in_mwh: f64) -> f64 {
        if external_energy_in_mwh > 0.0 {
            external_energy_in_mwh * self.charging_efficiency
        } else {
            external_energy_in_mwh / self.discharging_efficiency
        }
    }

    /// Converts an internal energy flow to the external flow it requires or
    /// yields; branch chosen by sign.
    #[inline]
    pub fn internal_to_external_energy(&self, internal_energy_in_mwh: f64) -> f64 {
        if internal_energy_in_mwh > 0.0 {
            internal_energy_in_mwh / self.charging_efficiency
        } else {
            internal_energy_in_mwh * self.discharging_efficiency
        }
    }

    /// (Dis-)charges the device for one operation period.
    ///
    /// Applies efficiency conversion, power limits, self-discharge and the
    /// energy capacity bounds, then returns the external power actually
    /// realised at the grid connection.
    pub fn charge_in_mw(&mut self, external_charging_power_in_mw: f64, time: TimeStamp) -> f64 {
        let hours = OPERATION_PERIOD_IN_HOURS;
        let mut internal_delta_in_mwh =
            self.external_to_internal_energy(external_charging_power_in_mw * hours);
        internal_delta_in_mwh = self.consider_power_limits(internal_delta_in_mwh, hours);

        let internal_self_discharge_in_mwh =
            self.energy_in_storage_in_mwh * self.self_discharge_rate_per_hour * hours;
        self.track_internal_losses(internal_self_discharge_in_mwh, time);

        let next_energy_in_mwh = (self.energy_in_storage_in_mwh + internal_delta_in_mwh
            - internal_self_discharge_in_mwh)
            .clamp(0.0, self.energy_storage_capacity_in_mwh);

        let realised_internal_delta_in_mwh = next_energy_in_mwh - self.energy_in_storage_in_mwh;
        self.energy_in_storage_in_mwh = next_energy_in_mwh;

        self.accounted_internal_flows_in_mwh += realised_internal_delta_in_mwh.abs();
        if self.energy_storage_capacity_in_mwh > 0.0 {
            self.accounted_full_storage_cycles +=
                realised_internal_delta_in_mwh.abs() / (2.0 * self.energy_storage_capacity_in_mwh);
        }

        self.internal_to_external_energy(
            realised_internal_delta_in_mwh + internal_self_discharge_in_mwh,
        ) / hours
    }

    /// Clips an internal flow to the installed power, corrected per branch:
    /// charging stores at most `installed * charge_eff`, discharging drains
    /// at most `installed / discharge_eff` so the external exchange stays
    /// within the installed power either way.
    fn consider_power_limits(&self, internal_delta_in_mwh: f64, hours: f64) -> f64 {
        let charging_limit = self.installed_power_in_mw * hours * self.charging_efficiency;
        let discharging_limit = self.installed_power_in_mw * hours / self.discharging_efficiency;
        internal_delta_in_mwh.clamp(-discharging_limit, charging_limit)
    }

    /// Records the internal self-discharge of this period.
    ///
    /// The very first tracked sample is written as zero; only subsequent
    /// samples carry the actual self-discharge.
    fn track_internal_losses(&mut self, internal_self_discharge_in_mwh: f64, time: TimeStamp) {
        if self.discharging_deviation.is_empty() {
            self.discharging_deviation.insert(time, 0.0);
        } else {
            self.discharging_deviation
                .insert(time, internal_self_discharge_in_mwh);
        }
    }

    /// Tracked discharging deviation at `time`; falls back to the current
    /// self-discharge estimate for untracked stamps.
    pub fn discharging_deviation_for(&self, time: TimeStamp) -> f64 {
        match self.discharging_deviation.get(&time) {
            Some(deviation) => *deviation,
            None => self.energy_in_storage_in_mwh * self.self_discharge_rate_per_hour,
        }
    }

    /// Drops deviation samples strictly before `time`.
    pub fn clear_discharging_deviation_before(&mut self, time: TimeStamp) {
        self.discharging_deviation = self.discharging_deviation.split_off(&time);
    }

    /// Resets the flow and cycle counters to zero.
    pub fn reset_energy_accounting(&mut self) {
        self.accounted_internal_flows_in_mwh = 0.0;
        self.accounted_full_storage_cycles = 0.0;
    }

    #[inline]
    pub fn accounted_internal_flows_in_mwh(&self) -> f64 {
        self.accounted_internal_flows_in_mwh
    }

    #[inline]
    pub fn accounted_full_storage_cycles(&self) -> f64 {
        self.accounted_full_storage_cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn parameters() -> StorageParameters {
        StorageParameters {
            energy_to_power_ratio: 5.0,
            self_discharge_rate_per_hour: 0.0,
            charging_efficiency: 1.0,
            discharging_efficiency: 1.0,
            initial_energy_level_in_mwh: 0.0,
            installed_power_in_mw: 2.0,
        }
    }

    fn device(parameters: &StorageParameters) -> Device {
        Device::new(parameters).unwrap()
    }

    #[test]
    fn test_capacity_derivation() {
        let device = device(&parameters());
        assert_eq!(device.energy_storage_capacity_in_mwh(), 10.0);
    }

    #[test]
    fn test_invalid_efficiency_rejected() {
        let mut bad = parameters();
        bad.charging_efficiency = 0.0;
        assert!(Device::new(&bad).is_err());
        bad.charging_efficiency = 1.5;
        assert!(Device::new(&bad).is_err());
    }

    #[test]
    fn test_initial_energy_clamped_to_capacity() {
        let mut p = parameters();
        p.initial_energy_level_in_mwh = 99.0;
        assert_eq!(device(&p).energy_in_storage_in_mwh(), 10.0);
    }

    #[test]
    fn test_storage_cycle_scenario() {
        // 10 MWh capacity, 2 MW power, perfect efficiencies, no self-discharge.
        let mut device = device(&parameters());

        let realised = device.charge_in_mw(2.0, TimeStamp::from_hours(0));
        assert!((realised - 2.0).abs() < EPS);
        assert!((device.energy_in_storage_in_mwh() - 2.0).abs() < EPS);

        device.charge_in_mw(2.0, TimeStamp::from_hours(1));
        assert!((device.energy_in_storage_in_mwh() - 4.0).abs() < EPS);

        // Requesting 5 MW discharge is clamped to the installed 2 MW.
        let realised = device.charge_in_mw(-5.0, TimeStamp::from_hours(2));
        assert!((realised + 2.0).abs() < EPS);
        assert!((device.energy_in_storage_in_mwh() - 2.0).abs() < EPS);
    }

    #[test]
    fn test_discharge_limited_by_content() {
        let mut device = device(&parameters());
        device.charge_in_mw(1.0, TimeStamp::from_hours(0));
        let realised = device.charge_in_mw(-2.0, TimeStamp::from_hours(1));
        assert!((realised + 1.0).abs() < EPS);
        assert!(device.energy_in_storage_in_mwh().abs() < EPS);
    }

    #[test]
    fn test_charge_limited_by_capacity() {
        let mut p = parameters();
        p.initial_energy_level_in_mwh = 9.0;
        let mut device = device(&p);
        let realised = device.charge_in_mw(2.0, TimeStamp::from_hours(0));
        assert!((realised - 1.0).abs() < EPS);
        assert!((device.energy_in_storage_in_mwh() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_efficiency_round_trip() {
        let mut p = parameters();
        p.charging_efficiency = 0.8;
        p.discharging_efficiency = 0.9;
        let device = device(&p);
        for external in [-1.5, -0.3, 0.0, 0.7, 2.0] {
            let round_trip =
                device.internal_to_external_energy(device.external_to_internal_energy(external));
            assert!((round_trip - external).abs() < EPS);
        }
    }

    #[test]
    fn test_charging_applies_efficiency() {
        let mut p = parameters();
        p.charging_efficiency = 0.5;
        let mut device = device(&p);
        let realised = device.charge_in_mw(2.0, TimeStamp::from_hours(0));
        assert!((realised - 2.0).abs() < EPS);
        assert!((device.energy_in_storage_in_mwh() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_self_discharge_decays_to_zero() {
        let mut p = parameters();
        p.self_discharge_rate_per_hour = 0.1;
        p.initial_energy_level_in_mwh = 8.0;
        let mut device = device(&p);

        let mut previous = device.energy_in_storage_in_mwh();
        for hour in 0..200 {
            let realised = device.charge_in_mw(0.0, TimeStamp::from_hours(hour));
            assert!(realised.abs() < EPS); // idle device exchanges nothing
            let current = device.energy_in_storage_in_mwh();
            assert!(current <= previous + EPS);
            previous = current;
        }
        assert!(previous < 1e-6);
    }

    #[test]
    fn test_energy_stays_within_bounds() {
        let mut p = parameters();
        p.self_discharge_rate_per_hour = 0.05;
        p.charging_efficiency = 0.9;
        p.discharging_efficiency = 0.9;
        p.initial_energy_level_in_mwh = 5.0;
        let mut device = device(&p);
        let requests = [3.0, -4.0, 2.0, 2.0, 2.0, 2.0, -1.0, -5.0, 0.0, 4.0];
        for (hour, request) in requests.iter().enumerate() {
            device.charge_in_mw(*request, TimeStamp::from_hours(hour as u64));
            let energy = device.energy_in_storage_in_mwh();
            assert!(energy >= -EPS);
            assert!(energy <= device.energy_storage_capacity_in_mwh() + EPS);
        }
    }

    #[test]
    fn test_flow_and_cycle_accounting() {
        let mut device = device(&parameters());
        device.charge_in_mw(2.0, TimeStamp::from_hours(0));
        device.charge_in_mw(-2.0, TimeStamp::from_hours(1));
        assert!((device.accounted_internal_flows_in_mwh() - 4.0).abs() < EPS);
        // One full cycle moves 2 * capacity; 4 MWh moved is a fifth of it.
        assert!((device.accounted_full_storage_cycles() - 0.2).abs() < EPS);

        device.reset_energy_accounting();
        assert_eq!(device.accounted_internal_flows_in_mwh(), 0.0);
        assert_eq!(device.accounted_full_storage_cycles(), 0.0);
    }

    #[test]
    fn test_first_deviation_sample_is_zero() {
        let mut p = parameters();
        p.self_discharge_rate_per_hour = 0.1;
        p.initial_energy_level_in_mwh = 10.0;
        let mut device = device(&p);

        device.charge_in_mw(0.0, TimeStamp::from_hours(0));
        assert_eq!(device.discharging_deviation_for(TimeStamp::from_hours(0)), 0.0);

        device.charge_in_mw(0.0, TimeStamp::from_hours(1));
        assert!(device.discharging_deviation_for(TimeStamp::from_hours(1)) > 0.0);

        device.clear_discharging_deviation_before(TimeStamp::from_hours(1));
        // Cleared stamps fall back to the current self-discharge estimate.
        let estimate = device.energy_in_storage_in_mwh() * 0.1;
        assert!(
            (device.discharging_deviation_for(TimeStamp::from_hours(0)) - estimate).abs() < EPS
        );
    }
}
