//! Variable renewable trader: zero-marginal-cost supply from a yield series.

use types::{AwardData, Bid, BidsAtTime, InMemoryTimeSeries, TimeSeries, TimeStamp, TraderId};

use crate::error::Result;
use crate::trader::{Trader, TraderMetrics};

/// Offers the hourly yield potential at zero price.
pub struct RenewableTrader {
    id: TraderId,
    yield_series: InMemoryTimeSeries,
    metrics: TraderMetrics,
}

impl RenewableTrader {
    pub fn new(id: TraderId, yield_series: InMemoryTimeSeries) -> Self {
        Self {
            id,
            yield_series,
            metrics: TraderMetrics::default(),
        }
    }

    fn supply_bid(&self, time: TimeStamp) -> BidsAtTime {
        let mut bids = BidsAtTime::empty(time, self.id);
        bids.supply_bids.push(Bid::supply(
            self.yield_series.value_linear(time),
            0.0,
            0.0,
            self.id,
        ));
        bids
    }
}

impl Trader for RenewableTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "RenewableTrader"
    }

    fn forecast_bids_for(&mut self, time: TimeStamp) -> Option<BidsAtTime> {
        Some(self.supply_bid(time))
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        Ok(self.supply_bid(time))
    }

    fn digest_award(&mut self, award: &AwardData) -> Result<()> {
        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: award.supply_energy_in_mwh,
            awarded_demand_in_mwh: 0.0,
            cash_flow_in_eur: award.supply_energy_in_mwh * award.power_price_in_eur_per_mwh,
            stored_energy_in_mwh: None,
            produced_hydrogen_in_mwh: None,
        };
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}
