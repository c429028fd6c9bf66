//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a trading agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TraderId(pub u64);

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trader({})", self.0)
    }
}
