//! Fixed-resolution time series attached to components.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A single equally-spaced series of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleTimeSeries {
    /// Component attribute the series describes (e.g. `max_active_power`)
    pub variable_name: String,
    /// Timestamp of the first value
    pub initial_time: NaiveDateTime,
    /// Spacing between values, in seconds
    pub resolution: i64,
    pub data: Vec<f64>,
}

impl SingleTimeSeries {
    pub fn new(
        variable_name: impl Into<String>,
        initial_time: NaiveDateTime,
        resolution: i64,
        data: Vec<f64>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            initial_time,
            resolution,
            data,
        }
    }

    pub fn metadata(&self) -> TimeSeriesMetadata {
        TimeSeriesMetadata {
            variable_name: self.variable_name.clone(),
            initial_time: self.initial_time,
            resolution: self.resolution,
            length: self.data.len(),
        }
    }

    /// Timestamp of the value at `index`, `None` when it falls outside the
    /// representable date range.
    pub fn timestamp(&self, index: usize) -> Option<NaiveDateTime> {
        let offset = i64::try_from(index).ok()?.checked_mul(self.resolution)?;
        self.initial_time
            .checked_add_signed(TimeDelta::try_seconds(offset)?)
    }
}

/// Description of a stored series without its values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesMetadata {
    pub variable_name: String,
    pub initial_time: NaiveDateTime,
    pub resolution: i64,
    pub length: usize,
}

impl TimeSeriesMetadata {
    pub fn resolution_seconds(&self) -> i64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_metadata_mirrors_series() {
        let ts = SingleTimeSeries::new("max_active_power", start(), 3600, vec![1.0, 2.0, 3.0]);
        let meta = ts.metadata();
        assert_eq!(meta.variable_name, "max_active_power");
        assert_eq!(meta.length, 3);
        assert_eq!(meta.resolution_seconds(), 3600);
    }

    #[test]
    fn test_timestamps_step_by_resolution() {
        let ts = SingleTimeSeries::new("load", start(), 1800, vec![0.0; 4]);
        assert_eq!(ts.timestamp(0), Some(start()));
        assert_eq!(ts.timestamp(3), Some(start() + TimeDelta::minutes(90)));
    }

    #[test]
    fn test_timestamp_overflow_is_none() {
        let ts = SingleTimeSeries::new("load", start(), 10_000_000_000_000, vec![1.0, 2.0]);
        assert_eq!(ts.timestamp(0), Some(start()));
        assert_eq!(ts.timestamp(1), None);
        let ts = SingleTimeSeries::new("load", start(), i64::MAX, vec![1.0; 3]);
        assert_eq!(ts.timestamp(2), None);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "variable_name": "max_active_power",
            "initial_time": "2030-01-01T00:00:00",
            "resolution": 3600,
            "data": [0.5, 0.75]
        }"#;
        let ts: SingleTimeSeries = serde_json::from_str(json).unwrap();
        assert_eq!(ts.initial_time, start());
        assert_eq!(ts.data.len(), 2);
    }
}
