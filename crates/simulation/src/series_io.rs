//! Loading time series from CSV files.
//!
//! The expected layout is two columns with a header, e.g.:
//!
//! ```text
//! hour,value
//! 0,42.5
//! 1,38.0
//! ```

use std::path::Path;

use types::{InMemoryTimeSeries, TimeStamp};

use crate::error::{Result, SimulationError};

/// Loads an hourly time series from a two-column CSV file.
pub fn load_series_csv(path: &Path) -> Result<InMemoryTimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|error| match error.into_kind() {
            csv::ErrorKind::Io(source) => SimulationError::SeriesIo {
                path: path.display().to_string(),
                source,
            },
            other => SimulationError::SeriesFormat {
                path: path.display().to_string(),
                message: format!("{:?}", other),
            },
        })?;

    let mut points = Vec::new();
    for (row_index, row) in reader.records().enumerate() {
        let row = row?;
        let parse = |column: usize| -> Result<f64> {
            row.get(column)
                .ok_or_else(|| SimulationError::SeriesFormat {
                    path: path.display().to_string(),
                    message: format!("row {} has no column {}", row_index + 1, column),
                })?
                .trim()
                .parse::<f64>()
                .map_err(|error| SimulationError::SeriesFormat {
                    path: path.display().to_string(),
                    message: format!("row {}: {}", row_index + 1, error),
                })
        };
        let hour = parse(0)?;
        let value = parse(1)?;
        points.push((TimeStamp::from_hours(hour as u64), value));
    }
    if points.is_empty() {
        return Err(SimulationError::SeriesFormat {
            path: path.display().to_string(),
            message: "series contains no samples".into(),
        });
    }
    Ok(InMemoryTimeSeries::new(points))
}
