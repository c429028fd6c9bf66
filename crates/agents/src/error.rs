//! Error types for traders and strategists.

use std::fmt;

use devices::DeviceError;
use market_core::MarketCoreError;
use types::TimeStamp;

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised by traders and strategists.
///
/// All variants are fatal to the owning agent's run and propagate up to the
/// simulation kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Backward induction found no feasible final state.
    NoValidStrategy,
    /// A sensitivity-based strategist is missing a forecast it requires.
    MissingForecast { time: TimeStamp },
    /// A forecast was delivered to a strategist that cannot digest any.
    CannotUseForecast,
    /// A configured feature is not implemented.
    NotImplemented(&'static str),
    /// Invalid agent configuration detected at construction.
    InvalidConfig(String),
    /// A market operation failed.
    Market(MarketCoreError),
    /// A device operation failed.
    Device(DeviceError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::NoValidStrategy => write!(f, "no valid dispatch strategy found"),
            AgentError::MissingForecast { time } => {
                write!(f, "required forecast for {} was never delivered", time)
            }
            AgentError::CannotUseForecast => {
                write!(f, "strategist cannot digest forecasts; remove forecast wiring")
            }
            AgentError::NotImplemented(what) => write!(f, "{} is not implemented", what),
            AgentError::InvalidConfig(message) => write!(f, "invalid configuration: {}", message),
            AgentError::Market(error) => write!(f, "market error: {}", error),
            AgentError::Device(error) => write!(f, "device error: {}", error),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<MarketCoreError> for AgentError {
    fn from(error: MarketCoreError) -> Self {
        AgentError::Market(error)
    }
}

impl From<DeviceError> for AgentError {
    fn from(error: DeviceError) -> Self {
        AgentError::Device(error)
    }
}
