//! Trader agents: the market-facing glue between devices, strategists and
//! the day-ahead clearing.

mod conventional;
mod demand;
mod electrolysis;
mod green_hydrogen;
mod renewable;
mod storage;

pub use conventional::{ConventionalTrader, ConventionalTraderConfig};
pub use demand::DemandTrader;
pub use electrolysis::ElectrolysisTrader;
pub use green_hydrogen::{CorrelationInterval, GreenHydrogenTrader, GreenHydrogenTraderConfig};
pub use renewable::RenewableTrader;
pub use storage::StorageTrader;

use market_core::{MeritOrderSensitivity, SensitivityFlavor};
use types::{AmountAtTime, AwardData, BidsAtTime, TimeStamp, TraderId};

use crate::error::Result;

/// A trader's request for per-hour sensitivities from the forecaster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityRequest {
    pub flavor: SensitivityFlavor,
    pub max_charging_power_in_mw: f64,
    pub max_discharging_power_in_mw: f64,
}

/// Per-step accounting snapshot of one trader.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraderMetrics {
    pub awarded_supply_in_mwh: f64,
    pub awarded_demand_in_mwh: f64,
    /// Net cash flow of the step: revenues minus costs.
    pub cash_flow_in_eur: f64,
    /// Stored energy after settlement, for storage-backed traders.
    pub stored_energy_in_mwh: Option<f64>,
    /// Hydrogen produced in the step, for electrolysis traders.
    pub produced_hydrogen_in_mwh: Option<f64>,
}

/// A market participant driven by the simulation kernel.
///
/// Within one clearing step the kernel calls, in order: forecast delivery
/// (only where requested), `bids_for`, then `digest_award` after clearing.
/// Each handler runs to completion; errors abort the run.
pub trait Trader: Send {
    fn id(&self) -> TraderId;

    fn name(&self) -> &str;

    /// True if this trader consumes plain electricity price forecasts.
    fn wants_price_forecast(&self) -> bool {
        false
    }

    fn receive_price_forecasts(&mut self, _forecasts: &[AmountAtTime]) -> Result<()> {
        Ok(())
    }

    /// Sensitivity needed per hour, if any.
    fn sensitivity_request(&self) -> Option<SensitivityRequest> {
        None
    }

    fn receive_sensitivity(
        &mut self,
        _time: TimeStamp,
        _sensitivity: MeritOrderSensitivity,
    ) -> Result<()> {
        Ok(())
    }

    /// Bids used by the market forecaster when pre-clearing future hours.
    ///
    /// Defaults to no participation in forecast clearings; deterministic
    /// series-driven traders override this with their actual bids.
    fn forecast_bids_for(&mut self, _time: TimeStamp) -> Option<BidsAtTime> {
        None
    }

    /// Bids for the actual clearing of the given delivery hour.
    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime>;

    /// Settles the clearing outcome for this trader.
    fn digest_award(&mut self, award: &AwardData) -> Result<()>;

    /// Accounting snapshot of the last settled step.
    fn metrics(&self) -> TraderMetrics {
        TraderMetrics::default()
    }
}
