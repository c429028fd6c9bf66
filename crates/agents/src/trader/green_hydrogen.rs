//! Green-hydrogen trader: electrolysis coupled to a contracted renewable
//! producer with hourly equivalence between consumption and yield.

use devices::Electrolyzer;
use types::{
    AwardData, Bid, BidsAtTime, InMemoryTimeSeries, TimeSeries, TimeStamp, TraderId,
    OPERATION_PERIOD_IN_HOURS,
};

use crate::error::{AgentError, Result};
use crate::trader::{Trader, TraderMetrics};

/// Period over which consumed electricity and renewable yield must balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationInterval {
    Hourly,
    /// Aggregate balancing over a billing month; would require an extra
    /// cumulative-production axis in the dispatch optimisation.
    Monthly,
}

/// Configuration of a green-hydrogen trader.
#[derive(Debug, Clone)]
pub struct GreenHydrogenTraderConfig {
    /// Fixed PPA price paid to the contracted producer per MWh of yield.
    pub ppa_price_in_eur_per_mwh: f64,
    /// Fixed support rate added on top of the hydrogen sale price.
    pub support_rate_in_eur_per_thermal_mwh: f64,
    pub correlation_interval: CorrelationInterval,
}

/// Buys the electrolyser's PPA-covered consumption and sells the surplus.
///
/// Per hour the trader caps consumption at the electrolyser rating and the
/// contracted yield, bids that consumption as demand at the hydrogen
/// opportunity cost, and offers the remaining yield as supply at zero.
/// No grey electricity is bought: hydrogen output shrinks when yield does.
pub struct GreenHydrogenTrader {
    id: TraderId,
    electrolyzer: Electrolyzer,
    ppa_yield_series: InMemoryTimeSeries,
    hydrogen_price_series: InMemoryTimeSeries,
    config: GreenHydrogenTraderConfig,
    last_yield_potential_in_mwh: f64,
    metrics: TraderMetrics,
}

impl GreenHydrogenTrader {
    pub fn new(
        id: TraderId,
        electrolyzer: Electrolyzer,
        ppa_yield_series: InMemoryTimeSeries,
        hydrogen_price_series: InMemoryTimeSeries,
        config: GreenHydrogenTraderConfig,
    ) -> Result<Self> {
        if config.correlation_interval == CorrelationInterval::Monthly {
            return Err(AgentError::NotImplemented(
                "monthly green-hydrogen equivalence",
            ));
        }
        Ok(Self {
            id,
            electrolyzer,
            ppa_yield_series,
            hydrogen_price_series,
            config,
            last_yield_potential_in_mwh: 0.0,
            metrics: TraderMetrics::default(),
        })
    }

    /// Value of one electric MWh when converted to hydrogen and sold.
    fn opportunity_cost_at(&self, time: TimeStamp) -> f64 {
        let hydrogen_price = self.hydrogen_price_series.value_linear(time);
        (hydrogen_price + self.config.support_rate_in_eur_per_thermal_mwh)
            * self.electrolyzer.conversion_factor()
    }
}

impl Trader for GreenHydrogenTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "GreenHydrogenTrader"
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        let yield_potential = self.ppa_yield_series.value_linear(time) * OPERATION_PERIOD_IN_HOURS;
        let electrolyser_demand = self
            .electrolyzer
            .calc_capped_electric_demand_in_mw(yield_potential);
        let surplus = yield_potential - electrolyser_demand;
        self.last_yield_potential_in_mwh = yield_potential;

        let mut bids = BidsAtTime::empty(time, self.id);
        bids.demand_bids.push(Bid::demand(
            electrolyser_demand,
            self.opportunity_cost_at(time),
            0.0,
            self.id,
        ));
        bids.supply_bids.push(Bid::supply(surplus, 0.0, 0.0, self.id));
        Ok(bids)
    }

    fn digest_award(&mut self, award: &AwardData) -> Result<()> {
        let time = award.begin_of_delivery_interval;
        let consumed = award.demand_energy_in_mwh;
        let produced_hydrogen = self.electrolyzer.calc_produced_hydrogen_one_hour(consumed);

        let hydrogen_revenue = produced_hydrogen
            * (self.hydrogen_price_series.value_linear(time)
                + self.config.support_rate_in_eur_per_thermal_mwh);
        let electricity_cash = (award.supply_energy_in_mwh - consumed)
            * award.power_price_in_eur_per_mwh;
        let ppa_payout =
            self.last_yield_potential_in_mwh * self.config.ppa_price_in_eur_per_mwh;

        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: award.supply_energy_in_mwh,
            awarded_demand_in_mwh: consumed,
            cash_flow_in_eur: hydrogen_revenue + electricity_cash - ppa_payout,
            stored_energy_in_mwh: None,
            produced_hydrogen_in_mwh: Some(produced_hydrogen),
        };
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}
