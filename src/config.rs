//! Scenario presets for the power market gym binary.

use agents::{StrategistConfig, StrategistType};
use devices::{ElectrolyzerParameters, StorageParameters};
use simulation::{ScenarioConfig, SeriesSource, TraderSpec};

/// A day with a morning and evening load peak served by a three-plant merit
/// order, plus a price-taking storage arbitrageur.
pub fn storage_arbitrage() -> ScenarioConfig {
    let load: Vec<f64> = (0..24)
        .map(|hour| match hour {
            7..=9 | 18..=21 => 42.0,
            0..=5 => 18.0,
            _ => 30.0,
        })
        .collect();
    let price_forecast: Vec<f64> = load.iter().map(|&load| expected_price(load)).collect();

    ScenarioConfig {
        simulation_hours: 24,
        forecast_horizon_in_hours: 12,
        price_forecast: Some(SeriesSource::Hourly {
            values: price_forecast,
        }),
        traders: vec![
            TraderSpec::Renewable {
                yield_potential: SeriesSource::Hourly {
                    values: (0..24)
                        .map(|hour: i64| {
                            let midday_distance = (hour - 12).abs() as f64;
                            (10.0 - 1.5 * midday_distance).max(0.0)
                        })
                        .collect(),
                },
            },
            TraderSpec::Conventional {
                installed_power_in_mw: 25.0,
                efficiency: 0.45,
                emission_factor_in_t_per_mwh: 0.34,
                fuel_price: SeriesSource::Constant { value: 10.0 },
                co2_price: SeriesSource::Constant { value: 80.0 },
            },
            TraderSpec::Conventional {
                installed_power_in_mw: 20.0,
                efficiency: 0.40,
                emission_factor_in_t_per_mwh: 0.20,
                fuel_price: SeriesSource::Constant { value: 35.0 },
                co2_price: SeriesSource::Constant { value: 80.0 },
            },
            TraderSpec::Demand {
                load: SeriesSource::Hourly { values: load },
            },
            TraderSpec::Storage {
                device: StorageParameters {
                    energy_to_power_ratio: 4.0,
                    self_discharge_rate_per_hour: 0.0,
                    charging_efficiency: 0.95,
                    discharging_efficiency: 0.95,
                    initial_energy_level_in_mwh: 0.0,
                    installed_power_in_mw: 5.0,
                },
                strategist: StrategistConfig {
                    strategist_type: StrategistType::SingleAgentMaxProfitPriceTaker,
                    forecast_period_in_hours: 12,
                    schedule_duration_in_hours: 12,
                    number_of_energy_states: 51,
                    number_of_transition_states: 50,
                    ..Default::default()
                },
                dispatch_schedule: None,
                dispatch_tolerance_in_mwh: None,
            },
        ],
        ..Default::default()
    }
}

/// Rough merit-order price for the preset plant fleet at the given load.
fn expected_price(load_in_mw: f64) -> f64 {
    if load_in_mw <= 30.0 {
        (10.0 + 80.0 * 0.34) / 0.45
    } else {
        (35.0 + 80.0 * 0.20) / 0.40
    }
}

/// Green-hydrogen production from a contracted wind park with hourly
/// equivalence, next to a conventional fleet serving the local load.
pub fn green_hydrogen() -> ScenarioConfig {
    ScenarioConfig {
        simulation_hours: 24,
        forecast_horizon_in_hours: 8,
        traders: vec![
            TraderSpec::Conventional {
                installed_power_in_mw: 30.0,
                efficiency: 0.5,
                emission_factor_in_t_per_mwh: 0.2,
                fuel_price: SeriesSource::Constant { value: 25.0 },
                co2_price: SeriesSource::Constant { value: 80.0 },
            },
            TraderSpec::Demand {
                load: SeriesSource::Constant { value: 15.0 },
            },
            TraderSpec::GreenHydrogen {
                electrolyzer: ElectrolyzerParameters {
                    peak_consumption_in_mw: 6.0,
                    conversion_factor: 0.7,
                },
                ppa_yield: SeriesSource::Hourly {
                    values: (0..24)
                        .map(|hour| 4.0 + 4.0 * ((hour % 8) as f64 / 7.0))
                        .collect(),
                },
                hydrogen_price: SeriesSource::Constant { value: 95.0 },
                ppa_price_in_eur_per_mwh: 45.0,
                support_rate_in_eur_per_thermal_mwh: 20.0,
                monthly_equivalence: false,
            },
        ],
        ..Default::default()
    }
}

/// Resolves a preset by name.
pub fn preset(name: &str) -> Option<ScenarioConfig> {
    match name {
        "storage-arbitrage" => Some(storage_arbitrage()),
        "green-hydrogen" => Some(green_hydrogen()),
        _ => None,
    }
}

/// Names of all available presets.
pub const PRESET_NAMES: &[&str] = &["storage-arbitrage", "green-hydrogen"];
