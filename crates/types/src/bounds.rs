//! Legal price band of the day-ahead market.

use serde::{Deserialize, Serialize};

/// The extreme legal prices of the market.
///
/// The scarcity price forces demand awards unconditionally; the minimal
/// price forces supply awards. Bids priced outside the band are rejected.
/// Carried by the market clearing component rather than being global
/// constants, so scenarios can tighten the band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub scarcity_price_in_eur_per_mwh: f64,
    pub minimal_price_in_eur_per_mwh: f64,
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            scarcity_price_in_eur_per_mwh: 3000.0,
            minimal_price_in_eur_per_mwh: -500.0,
        }
    }
}

impl PriceBounds {
    /// True if `price` lies within the legal band (inclusive).
    pub fn contains(&self, price: f64) -> bool {
        price >= self.minimal_price_in_eur_per_mwh && price <= self.scarcity_price_in_eur_per_mwh
    }
}
