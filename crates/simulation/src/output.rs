//! Per-step output accounting written as CSV.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use agents::TraderMetrics;
use types::{TimeStamp, TraderId};

use crate::error::Result;

/// Market-level outcome of one clearing step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub time: TimeStamp,
    pub electricity_price_in_eur_per_mwh: f64,
    pub awarded_energy_in_mwh: f64,
    pub dispatch_system_cost_in_eur: f64,
}

/// One trader's accounting for one clearing step.
#[derive(Debug, Clone, PartialEq)]
pub struct TraderRecord {
    pub time: TimeStamp,
    pub trader_id: TraderId,
    pub trader_name: String,
    pub metrics: TraderMetrics,
}

/// Writes market-level records to `path`.
pub fn export_market_csv(records: &[StepRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_market_csv(records, io::BufWriter::new(file))
}

/// Writes market-level records to any writer.
pub fn write_market_csv(records: &[StepRecord], writer: impl Write) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record([
        "hour",
        "electricity_price_eur_per_mwh",
        "awarded_energy_mwh",
        "system_cost_eur",
    ])?;
    for record in records {
        csv_writer.write_record([
            format!("{}", record.time.step() / types::TICKS_PER_HOUR),
            format!("{:.6}", record.electricity_price_in_eur_per_mwh),
            format!("{:.6}", record.awarded_energy_in_mwh),
            format!("{:.6}", record.dispatch_system_cost_in_eur),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes per-trader records to `path`.
pub fn export_traders_csv(records: &[TraderRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_traders_csv(records, io::BufWriter::new(file))
}

/// Writes per-trader records to any writer.
pub fn write_traders_csv(records: &[TraderRecord], writer: impl Write) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record([
        "hour",
        "trader_id",
        "trader",
        "awarded_supply_mwh",
        "awarded_demand_mwh",
        "cash_flow_eur",
        "stored_energy_mwh",
        "produced_hydrogen_mwh",
    ])?;
    for record in records {
        csv_writer.write_record([
            format!("{}", record.time.step() / types::TICKS_PER_HOUR),
            format!("{}", record.trader_id.0),
            record.trader_name.clone(),
            format!("{:.6}", record.metrics.awarded_supply_in_mwh),
            format!("{:.6}", record.metrics.awarded_demand_in_mwh),
            format!("{:.6}", record.metrics.cash_flow_in_eur),
            optional_value(record.metrics.stored_energy_in_mwh),
            optional_value(record.metrics.produced_hydrogen_in_mwh),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn optional_value(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}
