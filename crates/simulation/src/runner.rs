//! The deterministic hourly simulation kernel.
//!
//! Each step handles one delivery hour in a fixed order: forecast delivery,
//! bid collection, market clearing, award fan-out, output recording. All
//! handlers run to completion before the next one starts; trader
//! registration order fixes the delivery order, so identical scenarios and
//! seeds reproduce identical runs.

use agents::{SensitivityRequest, Trader};
use market_core::{DistributionMethod, MarketClearing, MeritOrderSensitivity};
use tracing::{debug, info, warn};
use types::{BidsAtTime, ClearingTimes, PriceBounds, TimeStamp, TraderId, OPERATION_PERIOD};

use crate::error::Result;
use crate::forecaster::PriceForecasterFile;
use crate::output::{StepRecord, TraderRecord};

/// Aggregate counters over a simulation run.
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    /// Clearing steps executed.
    pub steps: u64,
    /// Total energy traded across all steps.
    pub total_awarded_energy_in_mwh: f64,
}

/// The simulation: a market, its traders, and the forecast plumbing.
pub struct Simulation {
    clearing: MarketClearing,
    bounds: PriceBounds,
    traders: Vec<Box<dyn Trader>>,
    price_forecaster: Option<PriceForecasterFile>,
    forecast_horizon_in_hours: usize,
    current_time: TimeStamp,
    step_records: Vec<StepRecord>,
    trader_records: Vec<TraderRecord>,
    stats: SimulationStats,
}

impl Simulation {
    pub fn new(
        bounds: PriceBounds,
        distribution_method: DistributionMethod,
        seed: u64,
        forecast_horizon_in_hours: usize,
        price_forecaster: Option<PriceForecasterFile>,
    ) -> Self {
        Self {
            clearing: MarketClearing::new(bounds, distribution_method, seed),
            bounds,
            traders: Vec::new(),
            price_forecaster,
            forecast_horizon_in_hours,
            current_time: TimeStamp::ZERO,
            step_records: Vec::new(),
            trader_records: Vec::new(),
            stats: SimulationStats::default(),
        }
    }

    /// Registers a trader; registration order is delivery order.
    pub fn add_trader(&mut self, trader: Box<dyn Trader>) {
        self.traders.push(trader);
    }

    pub fn trader_count(&self) -> usize {
        self.traders.len()
    }

    pub fn current_time(&self) -> TimeStamp {
        self.current_time
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn step_records(&self) -> &[StepRecord] {
        &self.step_records
    }

    pub fn trader_records(&self) -> &[TraderRecord] {
        &self.trader_records
    }

    /// Executes clearing steps for the given number of hours.
    pub fn run(&mut self, hours: u64) -> Result<()> {
        for _ in 0..hours {
            self.step()?;
        }
        info!(
            steps = self.stats.steps,
            traded_energy = self.stats.total_awarded_energy_in_mwh,
            "simulation finished"
        );
        Ok(())
    }

    /// Executes one clearing step for the current delivery hour.
    pub fn step(&mut self) -> Result<()> {
        let time = self.current_time;

        self.deliver_price_forecasts(time)?;
        self.deliver_sensitivities(time)?;

        let bundles = self.collect_bids(time)?;
        let mut supply_book = self.clearing.open_supply_book();
        let mut demand_book = self.clearing.open_demand_book();
        for bundle in bundles {
            supply_book.push_all(bundle.supply_bids)?;
            demand_book.push_all(bundle.demand_bids)?;
        }
        let result = self.clearing.clear(supply_book, demand_book)?;
        debug!(
            time = %time,
            price = result.awarded_price_in_eur_per_mwh,
            energy = result.awarded_cumulative_power_in_mwh,
            "market cleared"
        );

        let unserved_unsheddable = result.demand_book.unsheddable_demand(&self.bounds)
            - result.awarded_cumulative_power_in_mwh;
        if unserved_unsheddable > 1e-9 {
            warn!(
                time = %time,
                shortage = unserved_unsheddable,
                "supply shortage: unsheddable demand not fully served"
            );
        }

        let clearing_times = ClearingTimes::single(time);
        for trader in &mut self.traders {
            for &clearing_time in &clearing_times.times {
                let award = result.award_for(trader.id(), clearing_time);
                trader.digest_award(&award)?;
            }
            self.trader_records.push(TraderRecord {
                time,
                trader_id: trader.id(),
                trader_name: trader.name().to_string(),
                metrics: trader.metrics(),
            });
        }

        self.step_records.push(StepRecord {
            time,
            electricity_price_in_eur_per_mwh: result.awarded_price_in_eur_per_mwh,
            awarded_energy_in_mwh: result.awarded_cumulative_power_in_mwh,
            dispatch_system_cost_in_eur: result.system_cost_in_eur,
        });
        self.stats.steps += 1;
        self.stats.total_awarded_energy_in_mwh += result.awarded_cumulative_power_in_mwh;

        self.current_time = time.later_by(OPERATION_PERIOD);
        Ok(())
    }

    fn deliver_price_forecasts(&mut self, time: TimeStamp) -> Result<()> {
        let Some(forecaster) = &self.price_forecaster else {
            return Ok(());
        };
        let forecasts = forecaster.forecasts_for(time, self.forecast_horizon_in_hours);
        for trader in &mut self.traders {
            if trader.wants_price_forecast() {
                trader.receive_price_forecasts(&forecasts)?;
            }
        }
        Ok(())
    }

    /// Pre-clears every forecast hour from the traders' forecast bids and
    /// hands each requesting trader a sensitivity of its requested flavor.
    fn deliver_sensitivities(&mut self, time: TimeStamp) -> Result<()> {
        let requests: Vec<(usize, SensitivityRequest)> = self
            .traders
            .iter()
            .enumerate()
            .filter_map(|(index, trader)| {
                trader.sensitivity_request().map(|request| (index, request))
            })
            .collect();
        if requests.is_empty() {
            return Ok(());
        }

        for hour in 0..self.forecast_horizon_in_hours {
            let forecast_time = time.later_by(OPERATION_PERIOD.times(hour as u64));

            // The forecast clearing never distributes randomly, so a fixed
            // seed keeps it deterministic and independent of the main RNG.
            let mut forecast_clearing =
                MarketClearing::new(self.bounds, DistributionMethod::FirstComeFirstServe, 0);
            let mut supply_book = forecast_clearing.open_supply_book();
            let mut demand_book = forecast_clearing.open_demand_book();
            for trader in &mut self.traders {
                if let Some(bundle) = trader.forecast_bids_for(forecast_time) {
                    supply_book.push_all(bundle.supply_bids)?;
                    demand_book.push_all(bundle.demand_bids)?;
                }
            }
            let result = forecast_clearing.clear(supply_book, demand_book)?;

            for (index, request) in &requests {
                let mut sensitivity = MeritOrderSensitivity::new(
                    request.flavor,
                    request.max_charging_power_in_mw,
                    request.max_discharging_power_in_mw,
                );
                sensitivity.update_from_books(&result.supply_book, &result.demand_book);
                self.traders[*index].receive_sensitivity(forecast_time, sensitivity)?;
            }
        }
        Ok(())
    }

    fn collect_bids(&mut self, time: TimeStamp) -> Result<Vec<BidsAtTime>> {
        let mut bundles = Vec::with_capacity(self.traders.len());
        for trader in &mut self.traders {
            bundles.push(trader.bids_for(time)?);
        }
        Ok(bundles)
    }

    /// Trader records of the given trader, in step order.
    pub fn records_for(&self, trader_id: TraderId) -> Vec<&TraderRecord> {
        self.trader_records
            .iter()
            .filter(|record| record.trader_id == trader_id)
            .collect()
    }
}
