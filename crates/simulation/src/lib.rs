//! Simulation crate: the deterministic event loop of the power market gym.
//!
//! This crate coordinates one simulated day-ahead market:
//! - Hourly clearing steps with a fixed handler order
//! - Forecast delivery (plain prices and merit-order sensitivities)
//! - Scenario configuration with construction-time validation
//! - Per-step output accounting written as CSV
//!
//! # Example
//!
//! ```ignore
//! use simulation::{ScenarioConfig, SeriesSource, TraderSpec};
//!
//! let config = ScenarioConfig {
//!     simulation_hours: 24,
//!     traders: vec![TraderSpec::Demand {
//!         load: SeriesSource::Constant { value: 10.0 },
//!     }],
//!     ..Default::default()
//! };
//! let mut simulation = config.build()?;
//! simulation.run(config.simulation_hours)?;
//! ```

mod config;
mod error;
mod forecaster;
mod output;
mod runner;
mod series_io;

pub use config::{ScenarioConfig, SeriesSource, TraderSpec};
pub use error::{Result, SimulationError};
pub use forecaster::PriceForecasterFile;
pub use output::{
    export_market_csv, export_traders_csv, write_market_csv, write_traders_csv, StepRecord,
    TraderRecord,
};
pub use runner::{Simulation, SimulationStats};
pub use series_io::load_series_csv;
