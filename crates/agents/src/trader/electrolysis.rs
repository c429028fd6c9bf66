//! Grid-buying electrolysis trader: dispatches a hydrogen buffer with the
//! dynamic-programming strategist, valuing consumed electricity at the
//! hydrogen price.

use devices::{Device, Electrolyzer};
use types::{AmountAtTime, AwardData, Bid, BidsAtTime, TimePeriod, TimeStamp, TraderId};

use crate::error::Result;
use crate::schedule::BidSchedule;
use crate::strategist::{DynamicProgrammingStrategist, Strategist};
use crate::trader::{Trader, TraderMetrics};

/// Plans flexible hydrogen production against electricity price forecasts.
///
/// The storage device models the hydrogen buffer in electric-equivalent
/// energy: charging it runs the electrolyser. Hydrogen revenue enters the
/// optimisation through the electrolysis assessment function, so production
/// shifts into cheap-electricity hours.
pub struct ElectrolysisTrader {
    id: TraderId,
    device: Device,
    electrolyzer: Electrolyzer,
    strategist: DynamicProgrammingStrategist,
    hydrogen_price_forecasts: Vec<AmountAtTime>,
    schedule: Option<BidSchedule>,
    total_produced_hydrogen_in_mwh: f64,
    metrics: TraderMetrics,
}

impl ElectrolysisTrader {
    pub fn new(
        id: TraderId,
        device: Device,
        electrolyzer: Electrolyzer,
        strategist: DynamicProgrammingStrategist,
        hydrogen_price_forecasts: Vec<AmountAtTime>,
    ) -> Self {
        Self {
            id,
            device,
            electrolyzer,
            strategist,
            hydrogen_price_forecasts,
            schedule: None,
            total_produced_hydrogen_in_mwh: 0.0,
            metrics: TraderMetrics::default(),
        }
    }

    pub fn total_produced_hydrogen_in_mwh(&self) -> f64 {
        self.total_produced_hydrogen_in_mwh
    }

    fn ensure_schedule(&mut self, time: TimeStamp) -> Result<()> {
        let applicable = self
            .schedule
            .as_ref()
            .map(|schedule| schedule.is_applicable(time, self.device.energy_in_storage_in_mwh()))
            .unwrap_or(false);
        if !applicable {
            let start = TimePeriod::hour_starting_at(time);
            self.schedule = Some(self.strategist.plan(start, &self.device)?);
        }
        Ok(())
    }
}

impl Trader for ElectrolysisTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "ElectrolysisTrader"
    }

    fn wants_price_forecast(&self) -> bool {
        true
    }

    fn receive_price_forecasts(&mut self, forecasts: &[AmountAtTime]) -> Result<()> {
        self.strategist.accept_price_forecasts(forecasts)?;
        let hydrogen = std::mem::take(&mut self.hydrogen_price_forecasts);
        self.strategist.accept_hydrogen_price_forecasts(&hydrogen);
        self.hydrogen_price_forecasts = hydrogen;
        Ok(())
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        self.ensure_schedule(time)?;
        let schedule = self.schedule.as_ref().unwrap();
        let energy = schedule.requested_energy_for(time);
        let price = schedule.bid_price_for(time);

        let mut bids = BidsAtTime::empty(time, self.id);
        if energy > 0.0 {
            bids.demand_bids.push(Bid::demand(energy, price, 0.0, self.id));
        } else if energy < 0.0 {
            bids.supply_bids.push(Bid::supply(-energy, price, 0.0, self.id));
        }
        Ok(bids)
    }

    fn digest_award(&mut self, award: &AwardData) -> Result<()> {
        let time = award.begin_of_delivery_interval;
        let awarded_external_power = award.demand_energy_in_mwh - award.supply_energy_in_mwh;
        let realised = self.device.charge_in_mw(awarded_external_power, time);

        let produced_hydrogen = if realised > 0.0 {
            self.electrolyzer.calc_hydrogen_energy_in_mwh(realised)
        } else {
            0.0
        };
        self.total_produced_hydrogen_in_mwh += produced_hydrogen;

        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: award.supply_energy_in_mwh,
            awarded_demand_in_mwh: award.demand_energy_in_mwh,
            cash_flow_in_eur: (award.supply_energy_in_mwh - award.demand_energy_in_mwh)
                * award.power_price_in_eur_per_mwh,
            stored_energy_in_mwh: Some(self.device.energy_in_storage_in_mwh()),
            produced_hydrogen_in_mwh: Some(produced_hydrogen),
        };
        self.strategist.clear_before(time);
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}
