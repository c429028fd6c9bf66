//! The dynamic-programming strategist shared by all optimising variants.

use devices::Device;
use market_core::{MeritOrderSensitivity, SensitivityFlavor};
use types::{AmountAtTime, PriceBounds, TimePeriod, TimeStamp};

use crate::error::Result;
use crate::schedule::BidSchedule;
use crate::strategist::assessment::AssessmentFunction;
use crate::strategist::optimiser::Optimiser;
use crate::strategist::Strategist;

/// How scheduled exchanges are priced into bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidPricing {
    /// Price-taking bids at the hard limits of the legal band, forcing
    /// awards: demand at the scarcity price, supply at the minimal price.
    HardLimits,
    /// Award-boundary bids at the transition's specific value, nudged by the
    /// bid tolerance towards the awarded side.
    OpportunityCost,
}

/// A strategist planning by backward induction over discretised storage
/// states; variants differ only in their assessment function and pricing.
pub struct DynamicProgrammingStrategist {
    optimiser: Optimiser,
    assessment: Box<dyn AssessmentFunction + Send>,
    pricing: BidPricing,
    bounds: PriceBounds,
    bid_tolerance_in_eur_per_mwh: f64,
}

impl DynamicProgrammingStrategist {
    pub fn new(
        optimiser: Optimiser,
        assessment: Box<dyn AssessmentFunction + Send>,
        pricing: BidPricing,
        bounds: PriceBounds,
        bid_tolerance_in_eur_per_mwh: f64,
    ) -> Self {
        Self {
            optimiser,
            assessment,
            pricing,
            bounds,
            bid_tolerance_in_eur_per_mwh,
        }
    }

    /// Forwards hydrogen price forecasts to the assessment function.
    pub fn accept_hydrogen_price_forecasts(&mut self, forecasts: &[AmountAtTime]) {
        self.assessment.store_hydrogen_price_forecasts(forecasts);
    }

    fn calc_bid_price(&self, external_energy_delta_in_mwh: f64, specific_value: f64) -> f64 {
        if external_energy_delta_in_mwh == 0.0 {
            return f64::NAN;
        }
        match self.pricing {
            BidPricing::HardLimits => {
                if external_energy_delta_in_mwh < 0.0 {
                    self.bounds.minimal_price_in_eur_per_mwh
                } else {
                    self.bounds.scarcity_price_in_eur_per_mwh
                }
            }
            BidPricing::OpportunityCost => {
                if external_energy_delta_in_mwh > 0.0 {
                    specific_value + self.bid_tolerance_in_eur_per_mwh
                } else {
                    specific_value - self.bid_tolerance_in_eur_per_mwh
                }
            }
        }
    }
}

impl Strategist for DynamicProgrammingStrategist {
    fn plan(&mut self, start: TimePeriod, device: &Device) -> Result<BidSchedule> {
        let plan = self
            .optimiser
            .optimise(start, device, self.assessment.as_mut())?;
        let prices = plan
            .external_energy_deltas_in_mwh
            .iter()
            .zip(plan.specific_values_in_eur_per_mwh.iter())
            .map(|(&delta, &specific)| self.calc_bid_price(delta, specific))
            .collect();
        Ok(BidSchedule::new(
            start,
            plan.external_energy_deltas_in_mwh,
            prices,
            plan.initial_internal_energies_in_mwh,
        ))
    }

    fn wants_price_forecast(&self) -> bool {
        self.assessment.sensitivity_request().is_none()
    }

    fn accept_price_forecasts(&mut self, forecasts: &[AmountAtTime]) -> Result<()> {
        self.assessment.store_price_forecasts(forecasts);
        Ok(())
    }

    fn sensitivity_request(&self) -> Option<SensitivityFlavor> {
        self.assessment.sensitivity_request()
    }

    fn accept_sensitivity(
        &mut self,
        time: TimeStamp,
        sensitivity: MeritOrderSensitivity,
    ) -> Result<()> {
        self.assessment.store_sensitivity(time, sensitivity);
        Ok(())
    }

    fn clear_before(&mut self, time: TimeStamp) {
        self.assessment.clear_before(time);
    }
}
