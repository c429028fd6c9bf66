//! Dispatch strategists: plan forward bid schedules for flexible devices.

mod assessment;
mod dynamic_programming;
mod file_dispatcher;
mod optimiser;

pub use assessment::{
    AssessmentFunction, MaxProfitElectrolysis, MaxProfitPriceTaker, MaxProfitWithPriceImpact,
    MinSystemCost, Target,
};
pub use dynamic_programming::{BidPricing, DynamicProgrammingStrategist};
pub use file_dispatcher::{FileDispatcher, DEFAULT_DISPATCH_TOLERANCE_IN_MWH};
pub use optimiser::{DispatchPlan, Optimiser};

use devices::Device;
use market_core::{MeritOrderSensitivity, SensitivityFlavor};
use serde::{Deserialize, Serialize};
use types::{AmountAtTime, InMemoryTimeSeries, PriceBounds, TimePeriod, TimeStamp};

use crate::error::{AgentError, Result};
use crate::schedule::BidSchedule;

/// Recognised strategist variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategistType {
    /// Replay a relative charging series from file.
    DispatchFile,
    /// Maximise profit with a full price sensitivity (price impact).
    SingleAgentMaxProfit,
    /// Minimise total dispatch cost with a cost sensitivity.
    SingleAgentMinSystemCost,
    /// Maximise profit against a plain price forecast.
    SingleAgentMaxProfitPriceTaker,
}

/// Parameters shared by all strategist variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategistConfig {
    pub strategist_type: StrategistType,
    pub forecast_period_in_hours: usize,
    pub schedule_duration_in_hours: usize,
    pub bid_tolerance_in_eur_per_mwh: f64,
    pub number_of_energy_states: usize,
    pub number_of_transition_states: usize,
}

impl Default for StrategistConfig {
    fn default() -> Self {
        Self {
            strategist_type: StrategistType::SingleAgentMaxProfitPriceTaker,
            forecast_period_in_hours: 24,
            schedule_duration_in_hours: 24,
            bid_tolerance_in_eur_per_mwh: 1e-3,
            number_of_energy_states: 101,
            number_of_transition_states: 100,
        }
    }
}

/// A dispatch strategist: turns forecasts and a device state into a forward
/// bid schedule.
///
/// The forecast hooks default to rejecting deliveries, so strategists that
/// cannot digest forecasts report mis-wired scenarios with an explicit
/// error.
pub trait Strategist: Send {
    /// Produces a schedule starting at `start` for the configured duration.
    fn plan(&mut self, start: TimePeriod, device: &Device) -> Result<BidSchedule>;

    /// True if this strategist consumes plain electricity price forecasts.
    fn wants_price_forecast(&self) -> bool {
        false
    }

    fn accept_price_forecasts(&mut self, _forecasts: &[AmountAtTime]) -> Result<()> {
        Err(AgentError::CannotUseForecast)
    }

    /// Sensitivity flavor this strategist needs per hour, if any.
    fn sensitivity_request(&self) -> Option<SensitivityFlavor> {
        None
    }

    fn accept_sensitivity(
        &mut self,
        _time: TimeStamp,
        _sensitivity: MeritOrderSensitivity,
    ) -> Result<()> {
        Err(AgentError::CannotUseForecast)
    }

    /// Drops stored forecasts for hours before `time`.
    fn clear_before(&mut self, _time: TimeStamp) {}
}

/// Builds a strategist from its configuration.
///
/// `dispatch_series` is required for [`StrategistType::DispatchFile`] and
/// ignored otherwise; `dispatch_tolerance_in_mwh` falls back to
/// [`DEFAULT_DISPATCH_TOLERANCE_IN_MWH`].
pub fn build_strategist(
    config: &StrategistConfig,
    bounds: PriceBounds,
    dispatch_series: Option<InMemoryTimeSeries>,
    dispatch_tolerance_in_mwh: Option<f64>,
) -> Result<Box<dyn Strategist>> {
    let optimiser = || {
        Optimiser::new(
            config.number_of_energy_states,
            config.number_of_transition_states,
            config.forecast_period_in_hours,
            config.schedule_duration_in_hours,
        )
    };
    match config.strategist_type {
        StrategistType::DispatchFile => {
            let series = dispatch_series.ok_or_else(|| {
                AgentError::InvalidConfig(
                    "DispatchFile strategist requires a Schedule time series".into(),
                )
            })?;
            Ok(Box::new(FileDispatcher::new(
                series,
                dispatch_tolerance_in_mwh.unwrap_or(DEFAULT_DISPATCH_TOLERANCE_IN_MWH),
                config.schedule_duration_in_hours,
                bounds,
            )))
        }
        StrategistType::SingleAgentMaxProfit => Ok(Box::new(DynamicProgrammingStrategist::new(
            optimiser()?,
            Box::new(MaxProfitWithPriceImpact::default()),
            BidPricing::OpportunityCost,
            bounds,
            config.bid_tolerance_in_eur_per_mwh,
        ))),
        StrategistType::SingleAgentMinSystemCost => {
            Ok(Box::new(DynamicProgrammingStrategist::new(
                optimiser()?,
                Box::new(MinSystemCost::default()),
                BidPricing::HardLimits,
                bounds,
                config.bid_tolerance_in_eur_per_mwh,
            )))
        }
        StrategistType::SingleAgentMaxProfitPriceTaker => {
            Ok(Box::new(DynamicProgrammingStrategist::new(
                optimiser()?,
                Box::new(MaxProfitPriceTaker::default()),
                BidPricing::HardLimits,
                bounds,
                config.bid_tolerance_in_eur_per_mwh,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_all_variants() {
        let bounds = PriceBounds::default();
        for strategist_type in [
            StrategistType::SingleAgentMaxProfit,
            StrategistType::SingleAgentMinSystemCost,
            StrategistType::SingleAgentMaxProfitPriceTaker,
        ] {
            let config = StrategistConfig {
                strategist_type,
                ..Default::default()
            };
            assert!(build_strategist(&config, bounds, None, None).is_ok());
        }
    }

    #[test]
    fn test_dispatch_file_requires_series() {
        let config = StrategistConfig {
            strategist_type: StrategistType::DispatchFile,
            ..Default::default()
        };
        let result = build_strategist(&config, PriceBounds::default(), None, None);
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn test_sensitivity_requests_match_variant() {
        let bounds = PriceBounds::default();
        let price_taker = build_strategist(&StrategistConfig::default(), bounds, None, None).unwrap();
        assert!(price_taker.sensitivity_request().is_none());
        assert!(price_taker.wants_price_forecast());

        let config = StrategistConfig {
            strategist_type: StrategistType::SingleAgentMaxProfit,
            ..Default::default()
        };
        let with_impact = build_strategist(&config, bounds, None, None).unwrap();
        assert_eq!(
            with_impact.sensitivity_request(),
            Some(SensitivityFlavor::Price)
        );
        assert!(!with_impact.wants_price_forecast());
    }
}
