//! Storage trader: couples a storage device with a dispatch strategist.

use devices::Device;
use market_core::MeritOrderSensitivity;
use tracing::warn;
use types::{AmountAtTime, AwardData, Bid, BidsAtTime, TimePeriod, TimeStamp, TraderId};

use crate::error::Result;
use crate::schedule::BidSchedule;
use crate::strategist::Strategist;
use crate::trader::{SensitivityRequest, Trader, TraderMetrics};

/// Trades one storage device at the day-ahead market.
///
/// Per clearing event the trader reuses its schedule while it stays
/// applicable and otherwise requests a fresh one from the strategist. Each
/// hour yields at most one bid: demand when charging, supply when
/// discharging.
pub struct StorageTrader {
    id: TraderId,
    device: Device,
    strategist: Box<dyn Strategist>,
    schedule: Option<BidSchedule>,
    dispatch_tolerance_in_mwh: f64,
    last_requested_energy_in_mwh: f64,
    metrics: TraderMetrics,
}

impl StorageTrader {
    pub fn new(
        id: TraderId,
        device: Device,
        strategist: Box<dyn Strategist>,
        dispatch_tolerance_in_mwh: f64,
    ) -> Self {
        Self {
            id,
            device,
            strategist,
            schedule: None,
            dispatch_tolerance_in_mwh,
            last_requested_energy_in_mwh: 0.0,
            metrics: TraderMetrics::default(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Replaces the schedule when the current one does not cover `time` or
    /// the device drifted off the scheduled trajectory.
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

impl Trader for StorageTrader {
    fn id(&self) -> TraderId {
        self.id
    }

    fn name(&self) -> &str {
        "StorageTrader"
    }

    fn wants_price_forecast(&self) -> bool {
        self.strategist.wants_price_forecast()
    }

    fn receive_price_forecasts(&mut self, forecasts: &[AmountAtTime]) -> Result<()> {
        self.strategist.accept_price_forecasts(forecasts)
    }

    fn sensitivity_request(&self) -> Option<SensitivityRequest> {
        self.strategist
            .sensitivity_request()
            .map(|flavor| SensitivityRequest {
                flavor,
                max_charging_power_in_mw: self.device.external_charging_power_in_mw(),
                max_discharging_power_in_mw: self.device.external_discharging_power_in_mw(),
            })
    }

    fn receive_sensitivity(
        &mut self,
        time: TimeStamp,
        sensitivity: MeritOrderSensitivity,
    ) -> Result<()> {
        self.strategist.accept_sensitivity(time, sensitivity)
    }

    fn bids_for(&mut self, time: TimeStamp) -> Result<BidsAtTime> {
        self.ensure_schedule(time)?;
        let schedule = self.schedule.as_ref().unwrap();
        let energy = schedule.requested_energy_for(time);
        let price = schedule.bid_price_for(time);
        self.last_requested_energy_in_mwh = energy;

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
        self.device.charge_in_mw(awarded_external_power, time);

        let deviation = (awarded_external_power - self.last_requested_energy_in_mwh).abs();
        if deviation > self.dispatch_tolerance_in_mwh {
            warn!(
                trader = %self.id,
                time = %time,
                requested = self.last_requested_energy_in_mwh,
                awarded = awarded_external_power,
                "awarded energy deviates from requested energy beyond tolerance"
            );
        }

        self.metrics = TraderMetrics {
            awarded_supply_in_mwh: award.supply_energy_in_mwh,
            awarded_demand_in_mwh: award.demand_energy_in_mwh,
            cash_flow_in_eur: (award.supply_energy_in_mwh - award.demand_energy_in_mwh)
                * award.power_price_in_eur_per_mwh,
            stored_energy_in_mwh: Some(self.device.energy_in_storage_in_mwh()),
            produced_hydrogen_in_mwh: None,
        };
        self.device.clear_discharging_deviation_before(time);
        self.strategist.clear_before(time);
        Ok(())
    }

    fn metrics(&self) -> TraderMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategist::{build_strategist, StrategistConfig, StrategistType};
    use devices::StorageParameters;
    use types::PriceBounds;

    const EPS: f64 = 1e-9;

    fn trader() -> StorageTrader {
        let device = Device::new(&StorageParameters {
            energy_to_power_ratio: 1.0,
            self_discharge_rate_per_hour: 0.0,
            charging_efficiency: 1.0,
            discharging_efficiency: 1.0,
            initial_energy_level_in_mwh: 0.0,
            installed_power_in_mw: 1.0,
        })
        .unwrap();
        let config = StrategistConfig {
            strategist_type: StrategistType::SingleAgentMaxProfitPriceTaker,
            forecast_period_in_hours: 4,
            schedule_duration_in_hours: 4,
            number_of_energy_states: 11,
            number_of_transition_states: 10,
            ..Default::default()
        };
        let strategist = build_strategist(&config, PriceBounds::default(), None, None).unwrap();
        StorageTrader::new(TraderId(1), device, strategist, 0.1)
    }

    fn forecasts(prices: &[f64]) -> Vec<AmountAtTime> {
        prices
            .iter()
            .enumerate()
            .map(|(hour, &price)| AmountAtTime::new(TimeStamp::from_hours(hour as u64), price))
            .collect()
    }

    #[test]
    fn test_emits_single_sided_bids() {
        let mut trader = trader();
        trader
            .receive_price_forecasts(&forecasts(&[20.0, 80.0, 20.0, 80.0]))
            .unwrap();

        let bids = trader.bids_for(TimeStamp::from_hours(0)).unwrap();
        assert_eq!(bids.demand_bids.len(), 1);
        assert!(bids.supply_bids.is_empty());
        assert!((bids.demand_bids[0].energy_in_mwh - 1.0).abs() < EPS);
        assert_eq!(bids.demand_bids[0].price_in_eur_per_mwh, 3000.0);
    }

    #[test]
    fn test_award_updates_device_and_metrics() {
        let mut trader = trader();
        trader
            .receive_price_forecasts(&forecasts(&[20.0, 80.0, 20.0, 80.0]))
            .unwrap();
        trader.bids_for(TimeStamp::from_hours(0)).unwrap();

        let award = AwardData {
            supply_energy_in_mwh: 0.0,
            demand_energy_in_mwh: 1.0,
            power_price_in_eur_per_mwh: 20.0,
            begin_of_delivery_interval: TimeStamp::from_hours(0),
        };
        trader.digest_award(&award).unwrap();

        assert!((trader.device().energy_in_storage_in_mwh() - 1.0).abs() < EPS);
        let metrics = trader.metrics();
        assert_eq!(metrics.awarded_demand_in_mwh, 1.0);
        assert!((metrics.cash_flow_in_eur + 20.0).abs() < EPS);
        assert_eq!(metrics.stored_energy_in_mwh, Some(1.0));
    }

    #[test]
    fn test_schedule_reused_while_applicable() {
        let mut trader = trader();
        trader
            .receive_price_forecasts(&forecasts(&[20.0, 80.0, 20.0, 80.0]))
            .unwrap();
        trader.bids_for(TimeStamp::from_hours(0)).unwrap();
        let first_schedule = trader.schedule.clone().unwrap();

        // Settling the scheduled award keeps the trajectory on plan, so the
        // next hour reuses the same schedule.
        trader
            .digest_award(&AwardData {
                supply_energy_in_mwh: 0.0,
                demand_energy_in_mwh: 1.0,
                power_price_in_eur_per_mwh: 20.0,
                begin_of_delivery_interval: TimeStamp::from_hours(0),
            })
            .unwrap();
        let bids = trader.bids_for(TimeStamp::from_hours(1)).unwrap();
        assert_eq!(trader.schedule.as_ref().unwrap(), &first_schedule);
        assert_eq!(bids.supply_bids.len(), 1);

        // An off-schedule award (nothing charged) forces a replan.
        trader
            .digest_award(&AwardData {
                supply_energy_in_mwh: 0.0,
                demand_energy_in_mwh: 0.0,
                power_price_in_eur_per_mwh: 20.0,
                begin_of_delivery_interval: TimeStamp::from_hours(1),
            })
            .unwrap();
        trader.bids_for(TimeStamp::from_hours(2)).unwrap();
        assert_ne!(trader.schedule.as_ref().unwrap(), &first_schedule);
    }
}
