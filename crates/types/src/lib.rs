//! Core types for the power market simulation.
//!
//! This crate provides the shared vocabulary used across the simulation:
//! simulation time, trader identifiers, bids, the message bundles exchanged
//! between agents and the market, the legal price band, and the time-series
//! capability consumed by forecasters and dispatch-from-file strategists.

mod bid;
mod bounds;
mod ids;
mod messages;
mod time;
mod timeseries;

pub use bid::{Bid, BidSide};
pub use bounds::PriceBounds;
pub use ids::TraderId;
pub use messages::{AmountAtTime, AwardData, BidsAtTime, ClearingTimes, PointInTime};
pub use time::{
    TimePeriod, TimeSpan, TimeStamp, OPERATION_PERIOD, OPERATION_PERIOD_IN_HOURS, TICKS_PER_HOUR,
};
pub use timeseries::{InMemoryTimeSeries, TimeSeries};
