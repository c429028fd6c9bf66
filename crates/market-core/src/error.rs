//! Error types for market-core operations.

use std::fmt;

use types::{Bid, BidSide};

/// Result type for market-core operations.
pub type Result<T> = std::result::Result<T, MarketCoreError>;

/// Errors that can occur while building books or clearing the market.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketCoreError {
    /// A bid carried negative block power.
    NegativeBidPower { side: BidSide, energy_in_mwh: f64 },
    /// A bid was priced outside the legal band.
    PriceOutOfBounds { price_in_eur_per_mwh: f64 },
    /// A bid was pushed to a book of the opposite side.
    WrongSide { expected: BidSide },
}

impl MarketCoreError {
    pub(crate) fn negative_power(bid: &Bid) -> Self {
        MarketCoreError::NegativeBidPower {
            side: bid.side,
            energy_in_mwh: bid.energy_in_mwh,
        }
    }
}

impl fmt::Display for MarketCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketCoreError::NegativeBidPower {
                side,
                energy_in_mwh,
            } => write!(
                f,
                "negative {} bid power is forbidden: {} MWh",
                side, energy_in_mwh
            ),
            MarketCoreError::PriceOutOfBounds {
                price_in_eur_per_mwh,
            } => write!(
                f,
                "bid price {} EUR/MWh is outside the legal band",
                price_in_eur_per_mwh
            ),
            MarketCoreError::WrongSide { expected } => {
                write!(f, "bid side does not match {} order book", expected)
            }
        }
    }
}

impl std::error::Error for MarketCoreError {}
