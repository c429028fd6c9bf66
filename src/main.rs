//! Power Market Gym - main binary.
//!
//! Runs a day-ahead electricity market scenario and writes per-step market
//! and trader accounting as CSV.
//!
//! Usage:
//!   power-market-gym [PRESET | SCENARIO.json] [OUTPUT_DIR]
//!
//! Without arguments the `storage-arbitrage` preset runs and results land
//! in `./output`.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use simulation::{export_market_csv, export_traders_csv, ScenarioConfig, Simulation};
use tracing::error;

fn load_scenario(argument: &str) -> Result<ScenarioConfig, String> {
    if let Some(preset) = config::preset(argument) {
        return Ok(preset);
    }
    let path = Path::new(argument);
    if path.exists() {
        return ScenarioConfig::from_json_file(path).map_err(|error| error.to_string());
    }
    Err(format!(
        "unknown preset or missing scenario file '{}'; presets: {}",
        argument,
        config::PRESET_NAMES.join(", ")
    ))
}

fn print_summary(simulation: &Simulation) {
    let stats = simulation.stats();
    let prices: Vec<f64> = simulation
        .step_records()
        .iter()
        .map(|record| record.electricity_price_in_eur_per_mwh)
        .collect();
    let mean_price = prices.iter().sum::<f64>() / prices.len().max(1) as f64;

    eprintln!("╔══════════════════════════════════════════════════════╗");
    eprintln!("║  Power Market Gym - Run Summary                      ║");
    eprintln!("╠══════════════════════════════════════════════════════╣");
    eprintln!("║  Cleared hours:   {:>8}                           ║", stats.steps);
    eprintln!(
        "║  Traded energy:   {:>12.2} MWh                    ║",
        stats.total_awarded_energy_in_mwh
    );
    eprintln!(
        "║  Mean price:      {:>12.2} EUR/MWh                ║",
        mean_price
    );
    eprintln!("╚══════════════════════════════════════════════════════╝");
}

fn run() -> Result<(), String> {
    let mut arguments = std::env::args().skip(1);
    let scenario_argument = arguments.next().unwrap_or_else(|| "storage-arbitrage".into());
    let output_dir = PathBuf::from(arguments.next().unwrap_or_else(|| "output".into()));

    let scenario = load_scenario(&scenario_argument)?;
    let mut simulation = scenario.build().map_err(|error| error.to_string())?;
    simulation
        .run(scenario.simulation_hours)
        .map_err(|error| error.to_string())?;

    std::fs::create_dir_all(&output_dir).map_err(|error| error.to_string())?;
    export_market_csv(simulation.step_records(), &output_dir.join("market.csv"))
        .map_err(|error| error.to_string())?;
    export_traders_csv(simulation.trader_records(), &output_dir.join("traders.csv"))
        .map_err(|error| error.to_string())?;

    print_summary(&simulation);
    eprintln!("Results written to {}", output_dir.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
