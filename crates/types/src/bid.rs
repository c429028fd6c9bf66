//! Bids at the day-ahead market.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::TraderId;

/// Which side of the market a bid is on.
///
/// Bid energy is always non-negative; power flowing the other way is
/// expressed by a bid on the opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidSide {
    Supply,
    Demand,
}

impl BidSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            BidSide::Supply => BidSide::Demand,
            BidSide::Demand => BidSide::Supply,
        }
    }
}

impl fmt::Display for BidSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidSide::Supply => write!(f, "SUPPLY"),
            BidSide::Demand => write!(f, "DEMAND"),
        }
    }
}

/// A single bid for one hour of trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Offered (supply) or requested (demand) energy; never negative.
    pub energy_in_mwh: f64,
    /// Offered price.
    pub price_in_eur_per_mwh: f64,
    /// Marginal cost of the underlying asset, carried for system-cost accounting.
    pub marginal_cost_in_eur_per_mwh: f64,
    /// Side of the market.
    pub side: BidSide,
    /// Trader the bid belongs to.
    pub trader_id: TraderId,
}

impl Bid {
    /// Creates a supply bid.
    pub fn supply(
        energy_in_mwh: f64,
        price_in_eur_per_mwh: f64,
        marginal_cost_in_eur_per_mwh: f64,
        trader_id: TraderId,
    ) -> Self {
        Self {
            energy_in_mwh,
            price_in_eur_per_mwh,
            marginal_cost_in_eur_per_mwh,
            side: BidSide::Supply,
            trader_id,
        }
    }

    /// Creates a demand bid.
    pub fn demand(
        energy_in_mwh: f64,
        price_in_eur_per_mwh: f64,
        marginal_cost_in_eur_per_mwh: f64,
        trader_id: TraderId,
    ) -> Self {
        Self {
            energy_in_mwh,
            price_in_eur_per_mwh,
            marginal_cost_in_eur_per_mwh,
            side: BidSide::Demand,
            trader_id,
        }
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.3} MWh @ {:.2} EUR/MWh ({})",
            self.side, self.energy_in_mwh, self.price_in_eur_per_mwh, self.trader_id
        )
    }
}
