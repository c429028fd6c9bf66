//! Market-core: merit-order mechanics for the power market simulation.
//!
//! This crate provides the market-side components:
//! - Order books with a typestate lifecycle (append-only until closed)
//! - Uniform-price merit-order clearing with award distribution
//! - Merit-order sensitivities derived from cleared books
//! - Error handling for market operations

mod clearing;
mod error;
mod order_book;
mod sensitivity;

pub use clearing::{ClearingResult, MarketClearing};
pub use error::{MarketCoreError, Result};
pub use order_book::{
    BookSide, Demand, DistributionMethod, OrderBookItem, SortedBook, Supply, UnsortedBook,
    VIRTUAL_TRADER_ID,
};
pub use sensitivity::{
    MeritOrderSensitivity, PriceNoSensitivity, SensitivityFlavor, SensitivityItem, StepPower,
};
