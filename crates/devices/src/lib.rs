//! Physical device models for the power market simulation.

mod electrolyzer;
mod error;
mod storage;

pub use electrolyzer::{Electrolyzer, ElectrolyzerParameters};
pub use error::{DeviceError, Result};
pub use storage::{Device, StorageParameters};
