//! Error types for scenario configuration and the simulation kernel.

use agents::AgentError;
use devices::DeviceError;
use market_core::MarketCoreError;
use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors aborting a simulation run.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Invalid or incomplete scenario configuration; the run never starts.
    #[error("scenario configuration error: {0}")]
    Config(String),

    /// A referenced time-series file could not be read.
    #[error("failed to read time series {path}: {source}")]
    SeriesIo {
        path: String,
        source: std::io::Error,
    },

    /// A time-series file contained an unparsable row.
    #[error("malformed time series {path}: {message}")]
    SeriesFormat { path: String, message: String },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Market(#[from] MarketCoreError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
