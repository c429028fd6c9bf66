//! Electrolysis unit converting electricity to hydrogen.

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Design parameters of an electrolysis unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrolyzerParameters {
    /// Maximum electric consumption.
    pub peak_consumption_in_mw: f64,
    /// Thermal hydrogen energy produced per electric energy consumed.
    pub conversion_factor: f64,
}

/// An electrolysis unit with a fixed conversion factor.
#[derive(Debug, Clone)]
pub struct Electrolyzer {
    peak_consumption_in_mw: f64,
    conversion_factor: f64,
}

impl Electrolyzer {
    pub fn new(parameters: &ElectrolyzerParameters) -> Result<Self> {
        if !(parameters.peak_consumption_in_mw >= 0.0) {
            return Err(DeviceError::invalid(
                "PeakConsumptionInMW",
                parameters.peak_consumption_in_mw,
            ));
        }
        if !(parameters.conversion_factor > 0.0 && parameters.conversion_factor <= 1.0) {
            return Err(DeviceError::invalid(
                "ConversionFactor",
                parameters.conversion_factor,
            ));
        }
        Ok(Self {
            peak_consumption_in_mw: parameters.peak_consumption_in_mw,
            conversion_factor: parameters.conversion_factor,
        })
    }

    #[inline]
    pub fn peak_consumption_in_mw(&self) -> f64 {
        self.peak_consumption_in_mw
    }

    #[inline]
    pub fn conversion_factor(&self) -> f64 {
        self.conversion_factor
    }

    /// Electric demand capped at the unit's rating and at the available
    /// power; never negative.
    pub fn calc_capped_electric_demand_in_mw(&self, available_power_in_mw: f64) -> f64 {
        available_power_in_mw.max(0.0).min(self.peak_consumption_in_mw)
    }

    /// Thermal hydrogen energy produced from the given electric energy.
    pub fn calc_hydrogen_energy_in_mwh(&self, electric_energy_in_mwh: f64) -> f64 {
        electric_energy_in_mwh * self.conversion_factor
    }

    /// Electric energy required to produce the given thermal hydrogen energy.
    pub fn calc_electric_energy_in_mwh(&self, hydrogen_energy_in_mwh: f64) -> f64 {
        hydrogen_energy_in_mwh / self.conversion_factor
    }

    /// Hydrogen produced when running at the given electric power for one
    /// hour, capped at the unit's rating.
    pub fn calc_produced_hydrogen_one_hour(&self, electric_power_in_mw: f64) -> f64 {
        self.calc_hydrogen_energy_in_mwh(self.calc_capped_electric_demand_in_mw(electric_power_in_mw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn electrolyzer() -> Electrolyzer {
        Electrolyzer::new(&ElectrolyzerParameters {
            peak_consumption_in_mw: 10.0,
            conversion_factor: 0.7,
        })
        .unwrap()
    }

    #[test]
    fn test_demand_capping() {
        let unit = electrolyzer();
        assert_eq!(unit.calc_capped_electric_demand_in_mw(5.0), 5.0);
        assert_eq!(unit.calc_capped_electric_demand_in_mw(15.0), 10.0);
        assert_eq!(unit.calc_capped_electric_demand_in_mw(-3.0), 0.0);
    }

    #[test]
    fn test_conversion_round_trip() {
        let unit = electrolyzer();
        let hydrogen = unit.calc_hydrogen_energy_in_mwh(10.0);
        assert!((hydrogen - 7.0).abs() < 1e-12);
        assert!((unit.calc_electric_energy_in_mwh(hydrogen) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_conversion_factor_rejected() {
        let result = Electrolyzer::new(&ElectrolyzerParameters {
            peak_consumption_in_mw: 10.0,
            conversion_factor: 0.0,
        });
        assert!(result.is_err());
    }
}
