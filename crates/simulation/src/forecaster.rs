//! Price forecasting from a configured time series.

use types::{AmountAtTime, InMemoryTimeSeries, PointInTime, TimeSeries, TimeStamp, OPERATION_PERIOD};

/// Serves per-hour electricity price forecasts from a file-loaded series.
#[derive(Debug, Clone)]
pub struct PriceForecasterFile {
    series: InMemoryTimeSeries,
}

impl PriceForecasterFile {
    pub fn new(series: InMemoryTimeSeries) -> Self {
        Self { series }
    }

    /// Forecast for a single requested point in time.
    pub fn forecast_for(&self, request: PointInTime) -> AmountAtTime {
        AmountAtTime::new(request.valid_at, self.series.value_linear(request.valid_at))
    }

    /// Forecasts for `hours` consecutive operation periods starting at
    /// `first_time`.
    pub fn forecasts_for(&self, first_time: TimeStamp, hours: usize) -> Vec<AmountAtTime> {
        (0..hours)
            .map(|hour| {
                let valid_at = first_time.later_by(OPERATION_PERIOD.times(hour as u64));
                self.forecast_for(PointInTime { valid_at })
            })
            .collect()
    }
}
