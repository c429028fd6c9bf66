//! Trader agents and flexibility dispatch strategists.
//!
//! Traders are the market-facing agents: they turn device state and
//! forecasts into hourly bids and settle the clearing outcome back into
//! their devices and accounts. Strategists are the planning layer: a single
//! backward-induction optimiser parameterised by an assessment function
//! covers all optimising variants, and a file dispatcher replays prescribed
//! schedules.

mod error;
mod schedule;
pub mod strategist;
pub mod trader;

pub use error::{AgentError, Result};
pub use schedule::{BidSchedule, MAX_SCHEDULE_ENERGY_DEVIATION_IN_MWH};
pub use strategist::{
    build_strategist, AssessmentFunction, BidPricing, DispatchPlan, DynamicProgrammingStrategist,
    FileDispatcher, MaxProfitElectrolysis, MaxProfitPriceTaker, MaxProfitWithPriceImpact,
    MinSystemCost, Optimiser, Strategist, StrategistConfig, StrategistType, Target,
    DEFAULT_DISPATCH_TOLERANCE_IN_MWH,
};
pub use trader::{
    ConventionalTrader, ConventionalTraderConfig, CorrelationInterval, DemandTrader,
    ElectrolysisTrader, GreenHydrogenTrader, GreenHydrogenTraderConfig, RenewableTrader,
    SensitivityRequest, StorageTrader, Trader, TraderMetrics,
};
