//! Scenario configuration: typed parameters for a whole simulation run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use agents::{
    build_strategist, BidPricing, ConventionalTrader, ConventionalTraderConfig,
    CorrelationInterval, DemandTrader, DynamicProgrammingStrategist, ElectrolysisTrader,
    GreenHydrogenTrader, GreenHydrogenTraderConfig, MaxProfitElectrolysis, Optimiser,
    RenewableTrader, StorageTrader, StrategistConfig, DEFAULT_DISPATCH_TOLERANCE_IN_MWH,
};
use devices::{Device, Electrolyzer, ElectrolyzerParameters, StorageParameters};
use market_core::DistributionMethod;
use types::{AmountAtTime, InMemoryTimeSeries, PriceBounds, TimeSeries, TimeStamp, TraderId};

use crate::error::{Result, SimulationError};
use crate::forecaster::PriceForecasterFile;
use crate::runner::Simulation;
use crate::series_io::load_series_csv;

/// Where a scenario time series comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SeriesSource {
    /// Two-column CSV file (hour, value).
    File { path: String },
    /// Inline hourly values starting at hour zero.
    Hourly { values: Vec<f64> },
    /// The same value at all times.
    Constant { value: f64 },
}

impl SeriesSource {
    pub fn load(&self) -> Result<InMemoryTimeSeries> {
        match self {
            SeriesSource::File { path } => load_series_csv(Path::new(path)),
            SeriesSource::Hourly { values } => {
                if values.is_empty() {
                    return Err(SimulationError::Config(
                        "inline series requires at least one value".into(),
                    ));
                }
                Ok(InMemoryTimeSeries::from_hourly(values))
            }
            SeriesSource::Constant { value } => Ok(InMemoryTimeSeries::constant(*value)),
        }
    }
}

/// One trader in the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraderSpec {
    Conventional {
        installed_power_in_mw: f64,
        efficiency: f64,
        emission_factor_in_t_per_mwh: f64,
        fuel_price: SeriesSource,
        co2_price: SeriesSource,
    },
    Demand {
        load: SeriesSource,
    },
    Renewable {
        yield_potential: SeriesSource,
    },
    Storage {
        device: StorageParameters,
        strategist: StrategistConfig,
        dispatch_schedule: Option<SeriesSource>,
        dispatch_tolerance_in_mwh: Option<f64>,
    },
    GreenHydrogen {
        electrolyzer: ElectrolyzerParameters,
        ppa_yield: SeriesSource,
        hydrogen_price: SeriesSource,
        ppa_price_in_eur_per_mwh: f64,
        support_rate_in_eur_per_thermal_mwh: f64,
        monthly_equivalence: bool,
    },
    Electrolysis {
        device: StorageParameters,
        electrolyzer: ElectrolyzerParameters,
        strategist: StrategistConfig,
        hydrogen_price: SeriesSource,
        support_rate_in_eur_per_thermal_mwh: f64,
    },
}

/// Full configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Seed of the clearing RNG; part of the configuration so randomised
    /// award distribution is reproducible.
    pub seed: u64,
    pub distribution_method: DistributionMethod,
    pub price_bounds: PriceBounds,
    pub simulation_hours: u64,
    pub forecast_horizon_in_hours: usize,
    /// Electricity price forecast served to price-taking strategists.
    pub price_forecast: Option<SeriesSource>,
    pub traders: Vec<TraderSpec>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            distribution_method: DistributionMethod::FirstComeFirstServe,
            price_bounds: PriceBounds::default(),
            simulation_hours: 24,
            forecast_horizon_in_hours: 24,
            price_forecast: None,
            traders: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    /// Loads a scenario from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|error| SimulationError::Config(format!("{}: {}", path.display(), error)))
    }

    /// Builds the simulation with all traders wired up.
    ///
    /// Configuration problems surface here, before the run starts.
    pub fn build(&self) -> Result<Simulation> {
        let price_forecaster = self
            .price_forecast
            .as_ref()
            .map(|source| source.load().map(PriceForecasterFile::new))
            .transpose()?;
        let mut simulation = Simulation::new(
            self.price_bounds,
            self.distribution_method,
            self.seed,
            self.forecast_horizon_in_hours,
            price_forecaster,
        );

        for (index, spec) in self.traders.iter().enumerate() {
            let id = TraderId(index as u64 + 1);
            simulation.add_trader(self.build_trader(id, spec)?);
        }
        Ok(simulation)
    }

    fn build_trader(&self, id: TraderId, spec: &TraderSpec) -> Result<Box<dyn agents::Trader>> {
        match spec {
            TraderSpec::Conventional {
                installed_power_in_mw,
                efficiency,
                emission_factor_in_t_per_mwh,
                fuel_price,
                co2_price,
            } => {
                if !(*efficiency > 0.0 && *efficiency <= 1.0) {
                    return Err(SimulationError::Config(format!(
                        "conventional trader {} efficiency must be in (0, 1], got {}",
                        id, efficiency
                    )));
                }
                Ok(Box::new(ConventionalTrader::new(
                    id,
                    ConventionalTraderConfig {
                        installed_power_in_mw: *installed_power_in_mw,
                        efficiency: *efficiency,
                        emission_factor_in_t_per_mwh: *emission_factor_in_t_per_mwh,
                    },
                    fuel_price.load()?,
                    co2_price.load()?,
                )))
            }
            TraderSpec::Demand { load } => Ok(Box::new(DemandTrader::new(
                id,
                load.load()?,
                self.price_bounds,
            ))),
            TraderSpec::Renewable { yield_potential } => {
                Ok(Box::new(RenewableTrader::new(id, yield_potential.load()?)))
            }
            TraderSpec::Storage {
                device,
                strategist,
                dispatch_schedule,
                dispatch_tolerance_in_mwh,
            } => {
                let device = Device::new(device)?;
                let dispatch_series = dispatch_schedule
                    .as_ref()
                    .map(SeriesSource::load)
                    .transpose()?;
                let strategist = build_strategist(
                    strategist,
                    self.price_bounds,
                    dispatch_series,
                    *dispatch_tolerance_in_mwh,
                )?;
                Ok(Box::new(StorageTrader::new(
                    id,
                    device,
                    strategist,
                    dispatch_tolerance_in_mwh.unwrap_or(DEFAULT_DISPATCH_TOLERANCE_IN_MWH),
                )))
            }
            TraderSpec::GreenHydrogen {
                electrolyzer,
                ppa_yield,
                hydrogen_price,
                ppa_price_in_eur_per_mwh,
                support_rate_in_eur_per_thermal_mwh,
                monthly_equivalence,
            } => {
                let correlation_interval = if *monthly_equivalence {
                    CorrelationInterval::Monthly
                } else {
                    CorrelationInterval::Hourly
                };
                let trader = GreenHydrogenTrader::new(
                    id,
                    Electrolyzer::new(electrolyzer)?,
                    ppa_yield.load()?,
                    hydrogen_price.load()?,
                    GreenHydrogenTraderConfig {
                        ppa_price_in_eur_per_mwh: *ppa_price_in_eur_per_mwh,
                        support_rate_in_eur_per_thermal_mwh: *support_rate_in_eur_per_thermal_mwh,
                        correlation_interval,
                    },
                )?;
                Ok(Box::new(trader))
            }
            TraderSpec::Electrolysis {
                device,
                electrolyzer,
                strategist,
                hydrogen_price,
                support_rate_in_eur_per_thermal_mwh,
            } => {
                let device = Device::new(device)?;
                let electrolyzer = Electrolyzer::new(electrolyzer)?;
                let assessment = MaxProfitElectrolysis::new(
                    electrolyzer.conversion_factor(),
                    *support_rate_in_eur_per_thermal_mwh,
                );
                let optimiser = Optimiser::new(
                    strategist.number_of_energy_states,
                    strategist.number_of_transition_states,
                    strategist.forecast_period_in_hours,
                    strategist.schedule_duration_in_hours,
                )?;
                let dp_strategist = DynamicProgrammingStrategist::new(
                    optimiser,
                    Box::new(assessment),
                    BidPricing::HardLimits,
                    self.price_bounds,
                    strategist.bid_tolerance_in_eur_per_mwh,
                );
                let hydrogen_series = hydrogen_price.load()?;
                let horizon_hours = self.simulation_hours + self.forecast_horizon_in_hours as u64;
                let hydrogen_forecasts: Vec<AmountAtTime> = (0..horizon_hours)
                    .map(|hour| {
                        let time = TimeStamp::from_hours(hour);
                        AmountAtTime::new(time, hydrogen_series.value_linear(time))
                    })
                    .collect();
                Ok(Box::new(ElectrolysisTrader::new(
                    id,
                    device,
                    electrolyzer,
                    dp_strategist,
                    hydrogen_forecasts,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents::StrategistType;

    #[test]
    fn test_default_scenario_builds() {
        let simulation = ScenarioConfig::default().build().unwrap();
        assert_eq!(simulation.trader_count(), 0);
    }

    #[test]
    fn test_monthly_equivalence_is_a_config_error() {
        let config = ScenarioConfig {
            traders: vec![TraderSpec::GreenHydrogen {
                electrolyzer: ElectrolyzerParameters {
                    peak_consumption_in_mw: 5.0,
                    conversion_factor: 0.7,
                },
                ppa_yield: SeriesSource::Constant { value: 4.0 },
                hydrogen_price: SeriesSource::Constant { value: 90.0 },
                ppa_price_in_eur_per_mwh: 30.0,
                support_rate_in_eur_per_thermal_mwh: 0.0,
                monthly_equivalence: true,
            }],
            ..Default::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_dispatch_file_without_series_is_a_config_error() {
        let config = ScenarioConfig {
            traders: vec![TraderSpec::Storage {
                device: StorageParameters {
                    energy_to_power_ratio: 1.0,
                    self_discharge_rate_per_hour: 0.0,
                    charging_efficiency: 1.0,
                    discharging_efficiency: 1.0,
                    initial_energy_level_in_mwh: 0.0,
                    installed_power_in_mw: 1.0,
                },
                strategist: StrategistConfig {
                    strategist_type: StrategistType::DispatchFile,
                    ..Default::default()
                },
                dispatch_schedule: None,
                dispatch_tolerance_in_mwh: None,
            }],
            ..Default::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_scenario_round_trips_through_json() {
        let config = ScenarioConfig {
            price_forecast: Some(SeriesSource::Hourly {
                values: vec![20.0, 80.0],
            }),
            traders: vec![TraderSpec::Demand {
                load: SeriesSource::Constant { value: 10.0 },
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
