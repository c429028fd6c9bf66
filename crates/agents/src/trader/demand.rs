//! Inflexible demand trader: load served at any price.

use types::{
    AwardData, Bid, BidsAtTime, InMemoryTimeSeries, PriceBounds, TimeSeries, TimeStamp, TraderId,
};

use crate::error::Result;
use crate::trader::{Trader, TraderMetrics};

/// Bids a load series at the scarcity price so it is always served when
/// supply exists.
pub struct DemandTrader {
    id: TraderId,
    load_series: InMemoryTimeSeries,
    bounds: PriceBounds,
    metrics: TraderMetrics,
}

impl DemandTrader {
    pub fn new(id: TraderId, load_series: InMemoryTimeSeries, bounds: PriceBounds) -> Self {
        Self {
            id,
            load_series,
            bounds,
            metrics: TraderMetrics::default(),
        }
    }

    fn demand_bid(&self, time: TimeStamp) -> BidsAtTime {
        let mut bids = BidsAtTime::empty(time, self.id);
        bids.demand_bids.push(Bid::demand(
            self.load_series.value_linear(time),
            self.bounds.scarcity_price_in_eur_per_mwh,
            0.0,
            self.id,
        ));
        bids
    }
}

impl Trader for DemandTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "DemandTrader"
    }

    fn forecast_bids_for(&mut self, time: TimeStamp) -> Option<BidsAtTime> {
        Some(self.demand_bid(time))
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        Ok(self.demand_bid(time))
    }

    fn digest_award(&mut self, award: &AwardData) -> Result<()> {
        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: 0.0,
            awarded_demand_in_mwh: award.demand_energy_in_mwh,
            cash_flow_in_eur: -award.demand_energy_in_mwh * award.power_price_in_eur_per_mwh,
            stored_energy_in_mwh: None,
            produced_hydrogen_in_mwh: None,
        };
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bids_load_at_scarcity_price() {
        let mut trader = DemandTrader::new(
            TraderId(5),
            InMemoryTimeSeries::from_hourly(&[12.0, 8.0]),
            PriceBounds::default(),
        );
        let bids = trader.bids_for(TimeStamp::from_hours(1)).unwrap();
        assert_eq!(bids.demand_bids.len(), 1);
        assert_eq!(bids.demand_bids[0].energy_in_mwh, 8.0);
        assert_eq!(bids.demand_bids[0].price_in_eur_per_mwh, 3000.0);
    }
}
