//! Assessment functions: the transition-value objectives of the dynamic
//! programming optimiser.
//!
//! Each function values a single state transition given the forecasts it has
//! ingested. The optimiser extremises the sum of transition values over the
//! forecast horizon; whether that means maximising or minimising is the
//! function's [`Target`].

use std::collections::BTreeMap;

use market_core::{MeritOrderSensitivity, PriceNoSensitivity, SensitivityFlavor};
use types::{AmountAtTime, TimeStamp};

use crate::error::{AgentError, Result};

/// Direction of optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Maximise,
    Minimise,
}

impl Target {
    /// Worst possible value to start a search from.
    pub fn initial_value(self) -> f64 {
        match self {
            Target::Maximise => f64::NEG_INFINITY,
            Target::Minimise => f64::INFINITY,
        }
    }

    /// True if `candidate` strictly beats `best`; ties keep the incumbent.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Target::Maximise => candidate > best,
            Target::Minimise => candidate < best,
        }
    }
}

/// Values a single external energy transition under ingested forecasts.
pub trait AssessmentFunction {
    /// Loads the forecast for the given hour; fatal if a required
    /// sensitivity was never delivered.
    fn prepare_for(&mut self, time: TimeStamp) -> Result<()>;

    /// Value of exchanging `external_energy_delta_in_mwh` with the market in
    /// the prepared hour (positive delta charges).
    fn assess_transition(&self, external_energy_delta_in_mwh: f64) -> f64;

    fn target(&self) -> Target;

    /// Sensitivity flavor this function needs, if any.
    fn sensitivity_request(&self) -> Option<SensitivityFlavor> {
        None
    }

    fn store_price_forecasts(&mut self, _forecasts: &[AmountAtTime]) {}

    fn store_hydrogen_price_forecasts(&mut self, _forecasts: &[AmountAtTime]) {}

    fn store_sensitivity(&mut self, _time: TimeStamp, _sensitivity: MeritOrderSensitivity) {}

    /// Drops forecasts for hours before `time`.
    fn clear_before(&mut self, _time: TimeStamp) {}
}

/// Maximises profit against a price forecast, neglecting any price impact
/// of the own bids. Missing forecasts read as a price of zero.
#[derive(Debug, Default)]
pub struct MaxProfitPriceTaker {
    price_forecasts: BTreeMap<TimeStamp, PriceNoSensitivity>,
    current_price_in_eur_per_mwh: f64,
}

impl AssessmentFunction for MaxProfitPriceTaker {
    fn prepare_for(&mut self, time: TimeStamp) -> Result<()> {
        self.current_price_in_eur_per_mwh = self
            .price_forecasts
            .get(&time)
            .map(PriceNoSensitivity::price_forecast)
            .unwrap_or(0.0);
        Ok(())
    }

    fn assess_transition(&self, external_energy_delta_in_mwh: f64) -> f64 {
        -external_energy_delta_in_mwh * self.current_price_in_eur_per_mwh
    }

    fn target(&self) -> Target {
        Target::Maximise
    }

    fn store_price_forecasts(&mut self, forecasts: &[AmountAtTime]) {
        for forecast in forecasts {
            self.price_forecasts
                .insert(forecast.valid_at, PriceNoSensitivity::new(forecast.amount));
        }
    }

    fn clear_before(&mut self, time: TimeStamp) {
        self.price_forecasts = self.price_forecasts.split_off(&time);
    }
}

/// Maximises profit using a full price sensitivity, internalising the price
/// effect of the own bid. Requires a sensitivity for every planned hour.
#[derive(Debug, Default)]
pub struct MaxProfitWithPriceImpact {
    sensitivities: BTreeMap<TimeStamp, MeritOrderSensitivity>,
    current_time: TimeStamp,
}

impl AssessmentFunction for MaxProfitWithPriceImpact {
    fn prepare_for(&mut self, time: TimeStamp) -> Result<()> {
        if !self.sensitivities.contains_key(&time) {
            return Err(AgentError::MissingForecast { time });
        }
        self.current_time = time;
        Ok(())
    }

    fn assess_transition(&self, external_energy_delta_in_mwh: f64) -> f64 {
        match self.sensitivities.get(&self.current_time) {
            Some(sensitivity) => -sensitivity.monetary_value_at(external_energy_delta_in_mwh),
            None => f64::NAN,
        }
    }

    fn target(&self) -> Target {
        Target::Maximise
    }

    fn sensitivity_request(&self) -> Option<SensitivityFlavor> {
        Some(SensitivityFlavor::Price)
    }

    fn store_sensitivity(&mut self, time: TimeStamp, sensitivity: MeritOrderSensitivity) {
        self.sensitivities.insert(time, sensitivity);
    }

    fn clear_before(&mut self, time: TimeStamp) {
        self.sensitivities = self.sensitivities.split_off(&time);
    }
}

/// Minimises total dispatch cost using a cost sensitivity. Requires a
/// sensitivity for every planned hour.
#[derive(Debug, Default)]
pub struct MinSystemCost {
    sensitivities: BTreeMap<TimeStamp, MeritOrderSensitivity>,
    current_time: TimeStamp,
}

impl AssessmentFunction for MinSystemCost {
    fn prepare_for(&mut self, time: TimeStamp) -> Result<()> {
        if !self.sensitivities.contains_key(&time) {
            return Err(AgentError::MissingForecast { time });
        }
        self.current_time = time;
        Ok(())
    }

    fn assess_transition(&self, external_energy_delta_in_mwh: f64) -> f64 {
        match self.sensitivities.get(&self.current_time) {
            Some(sensitivity) => sensitivity.monetary_value_at(external_energy_delta_in_mwh),
            None => f64::NAN,
        }
    }

    fn target(&self) -> Target {
        Target::Minimise
    }

    fn sensitivity_request(&self) -> Option<SensitivityFlavor> {
        Some(SensitivityFlavor::Cost)
    }

    fn store_sensitivity(&mut self, time: TimeStamp, sensitivity: MeritOrderSensitivity) {
        self.sensitivities.insert(time, sensitivity);
    }

    fn clear_before(&mut self, time: TimeStamp) {
        self.sensitivities = self.sensitivities.split_off(&time);
    }
}

/// Price-taking profit maximiser for electrolysis: consuming electricity
/// (positive delta) additionally earns hydrogen revenue at the conversion
/// factor times the hydrogen value.
#[derive(Debug)]
pub struct MaxProfitElectrolysis {
    electricity: MaxProfitPriceTaker,
    hydrogen_price_forecasts: BTreeMap<TimeStamp, f64>,
    support_rate_in_eur_per_thermal_mwh: f64,
    conversion_factor: f64,
    current_hydrogen_value_in_eur_per_mwh: f64,
}

impl MaxProfitElectrolysis {
    pub fn new(conversion_factor: f64, support_rate_in_eur_per_thermal_mwh: f64) -> Self {
        Self {
            electricity: MaxProfitPriceTaker::default(),
            hydrogen_price_forecasts: BTreeMap::new(),
            support_rate_in_eur_per_thermal_mwh,
            conversion_factor,
            current_hydrogen_value_in_eur_per_mwh: 0.0,
        }
    }
}

impl AssessmentFunction for MaxProfitElectrolysis {
    fn prepare_for(&mut self, time: TimeStamp) -> Result<()> {
        self.electricity.prepare_for(time)?;
        let hydrogen_price = self
            .hydrogen_price_forecasts
            .get(&time)
            .copied()
            .unwrap_or(0.0);
        self.current_hydrogen_value_in_eur_per_mwh =
            hydrogen_price + self.support_rate_in_eur_per_thermal_mwh;
        Ok(())
    }

    fn assess_transition(&self, external_energy_delta_in_mwh: f64) -> f64 {
        let electricity_value = self.electricity.assess_transition(external_energy_delta_in_mwh);
        if external_energy_delta_in_mwh > 0.0 {
            electricity_value
                + external_energy_delta_in_mwh
                    * self.conversion_factor
                    * self.current_hydrogen_value_in_eur_per_mwh
        } else {
            electricity_value
        }
    }

    fn target(&self) -> Target {
        Target::Maximise
    }

    fn store_price_forecasts(&mut self, forecasts: &[AmountAtTime]) {
        self.electricity.store_price_forecasts(forecasts);
    }

    fn store_hydrogen_price_forecasts(&mut self, forecasts: &[AmountAtTime]) {
        for forecast in forecasts {
            self.hydrogen_price_forecasts
                .insert(forecast.valid_at, forecast.amount);
        }
    }

    fn clear_before(&mut self, time: TimeStamp) {
        self.electricity.clear_before(time);
        self.hydrogen_price_forecasts = self.hydrogen_price_forecasts.split_off(&time);
    }
}
