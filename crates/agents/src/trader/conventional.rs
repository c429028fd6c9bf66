//! Conventional generation trader: marginal-cost supply bids from fuel and
//! carbon prices.

use types::{AwardData, Bid, BidsAtTime, InMemoryTimeSeries, TimeSeries, TimeStamp, TraderId};

use crate::error::Result;
use crate::trader::{Trader, TraderMetrics};

/// Parameters of one aggregated conventional plant.
#[derive(Debug, Clone)]
pub struct ConventionalTraderConfig {
    pub installed_power_in_mw: f64,
    /// Electric efficiency of the plant.
    pub efficiency: f64,
    /// Specific CO2 emissions per thermal fuel energy.
    pub emission_factor_in_t_per_mwh: f64,
}

/// Offers the full plant capacity at marginal cost every hour.
pub struct ConventionalTrader {
    id: TraderId,
    config: ConventionalTraderConfig,
    fuel_price_series: InMemoryTimeSeries,
    co2_price_series: InMemoryTimeSeries,
    metrics: TraderMetrics,
}

impl ConventionalTrader {
    pub fn new(
        id: TraderId,
        config: ConventionalTraderConfig,
        fuel_price_series: InMemoryTimeSeries,
        co2_price_series: InMemoryTimeSeries,
    ) -> Self {
        Self {
            id,
            config,
            fuel_price_series,
            co2_price_series,
            metrics: TraderMetrics::default(),
        }
    }

    /// Marginal generation cost: fuel plus carbon, divided by efficiency.
    fn marginal_cost_at(&self, time: TimeStamp) -> f64 {
        let fuel = self.fuel_price_series.value_linear(time);
        let co2 = self.co2_price_series.value_linear(time);
        (fuel + co2 * self.config.emission_factor_in_t_per_mwh) / self.config.efficiency
    }

    fn supply_bid(&self, time: TimeStamp) -> BidsAtTime {
        let marginal_cost = self.marginal_cost_at(time);
        let mut bids = BidsAtTime::empty(time, self.id);
        bids.supply_bids.push(Bid::supply(
            self.config.installed_power_in_mw,
            marginal_cost,
            marginal_cost,
            self.id,
        ));
        bids
    }
}

impl Trader for ConventionalTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "ConventionalTrader"
    }

    fn forecast_bids_for(&mut self, time: TimeStamp) -> Option<BidsAtTime> {
        Some(self.supply_bid(time))
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        Ok(self.supply_bid(time))
    }

    fn digest_award(&mut self, award: &AwardData) -> Result<()> {
        let variable_cost = award.supply_energy_in_mwh
            * self.marginal_cost_at(award.begin_of_delivery_interval);
        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: award.supply_energy_in_mwh,
            awarded_demand_in_mwh: 0.0,
            cash_flow_in_eur: award.supply_energy_in_mwh * award.power_price_in_eur_per_mwh
                - variable_cost,
            stored_energy_in_mwh: None,
            produced_hydrogen_in_mwh: None,
        };
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}
