//! Typed message bundles exchanged between agents and the market.
//!
//! All bundles are plain serialisable data; the simulation kernel delivers
//! them in a deterministic order within each clearing step.

use serde::{Deserialize, Serialize};

use crate::bid::Bid;
use crate::ids::TraderId;
use crate::time::TimeStamp;

/// A bare point in time, e.g. a forecast request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointInTime {
    pub valid_at: TimeStamp,
}

/// A scalar amount attached to a point in time (price forecast, payout, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountAtTime {
    pub valid_at: TimeStamp,
    pub amount: f64,
}

impl AmountAtTime {
    pub fn new(valid_at: TimeStamp, amount: f64) -> Self {
        Self { valid_at, amount }
    }
}

/// Times at which the market will clear next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClearingTimes {
    pub times: Vec<TimeStamp>,
}

impl ClearingTimes {
    pub fn single(time: TimeStamp) -> Self {
        Self { times: vec![time] }
    }
}

/// All bids of one trader for a single delivery hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidsAtTime {
    pub delivery_time: TimeStamp,
    pub trader_id: TraderId,
    pub supply_bids: Vec<Bid>,
    pub demand_bids: Vec<Bid>,
}

impl BidsAtTime {
    /// Bundle without any bids, used by traders idle in this hour.
    pub fn empty(delivery_time: TimeStamp, trader_id: TraderId) -> Self {
        Self {
            delivery_time,
            trader_id,
            supply_bids: Vec::new(),
            demand_bids: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.supply_bids.is_empty() && self.demand_bids.is_empty()
    }
}

/// Clearing outcome for one trader and one delivery hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AwardData {
    /// Awarded supply energy of the trader.
    pub supply_energy_in_mwh: f64,
    /// Awarded demand energy of the trader.
    pub demand_energy_in_mwh: f64,
    /// Uniform clearing price.
    pub power_price_in_eur_per_mwh: f64,
    /// Start of the delivery interval the award refers to.
    pub begin_of_delivery_interval: TimeStamp,
}
