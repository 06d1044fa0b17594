//! TimeSeries data structure and sampling-granularity handling.

use crate::error::{AnomalyError, Result};
use chrono::{DateTime, Duration, Timelike, Utc};

/// Dominant sampling interval of a series.
///
/// Each granularity maps to a canonical seasonal period: minute-level data
/// carries a daily cycle of 1440 observations, hourly data a daily cycle of
/// 24, and daily data a weekly cycle of 7. Second-level data has no period
/// of its own; it is aggregated to per-minute sums before detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
}

impl Granularity {
    /// Number of observations in one seasonal cycle at this granularity.
    ///
    /// `None` for [`Granularity::Second`], which must be aggregated first.
    pub fn seasonal_period(self) -> Option<usize> {
        match self {
            Granularity::Second => None,
            Granularity::Minute => Some(1440),
            Granularity::Hour => Some(24),
            Granularity::Day => Some(7),
        }
    }

    /// Infer the granularity from the gap between the two largest timestamps.
    pub fn from_timestamps(timestamps: &[DateTime<Utc>]) -> Result<Granularity> {
        if timestamps.len() < 2 {
            return Err(AnomalyError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }

        let mut largest = timestamps[0];
        let mut second_largest = timestamps[0].min(timestamps[1]);
        for &t in timestamps {
            if t > largest {
                second_largest = largest;
                largest = t;
            } else if t > second_largest && t < largest {
                second_largest = t;
            }
        }

        let gap = (largest - second_largest).num_seconds();
        if gap >= 86400 {
            Ok(Granularity::Day)
        } else if gap >= 3600 {
            Ok(Granularity::Hour)
        } else if gap >= 60 {
            Ok(Granularity::Minute)
        } else if gap >= 1 {
            Ok(Granularity::Second)
        } else {
            Err(AnomalyError::GranularityInference(
                "sampling interval is finer than one second".to_string(),
            ))
        }
    }
}

/// A univariate time series of `(timestamp, value)` observations.
///
/// Timestamps must be strictly increasing; values may contain NaN at
/// construction time (the detector strips leading NaN and rejects internal
/// ones).
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a new series, validating shape and timestamp ordering.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnomalyError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(AnomalyError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the last timestamp, if any.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Extract a half-open sub-range `[start, end)` of the series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(AnomalyError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(AnomalyError::InvalidParameter(format!(
                "slice end {} exceeds series length {}",
                end,
                self.len()
            )));
        }
        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Infer the dominant sampling granularity.
    pub fn granularity(&self) -> Result<Granularity> {
        Granularity::from_timestamps(&self.timestamps)
    }

    /// Aggregate to per-minute sums.
    ///
    /// Sub-minute observations are bucketed by their containing minute and
    /// summed. This is lossy and one-way; it is the only repair the
    /// detection pipeline ever applies to its input.
    pub fn resample_minutely(&self) -> TimeSeries {
        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for (&t, &v) in self.timestamps.iter().zip(self.values.iter()) {
            let bucket = t - Duration::seconds(t.second() as i64)
                - Duration::nanoseconds(t.nanosecond() as i64);
            match timestamps.last() {
                Some(&last) if last == bucket => {
                    let idx = values.len() - 1;
                    values[idx] += v;
                }
                _ => {
                    timestamps.push(bucket);
                    values.push(v);
                }
            }
        }

        TimeSeries { timestamps, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spaced_timestamps(n: usize, step: Duration) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + step * i as i32).collect()
    }

    #[test]
    fn time_series_constructs_and_exposes_data() {
        let timestamps = spaced_timestamps(3, Duration::hours(1));
        let values = vec![1.0, 2.0, 3.0];

        let ts = TimeSeries::new(timestamps.clone(), values.clone()).unwrap();

        assert_eq!(ts.len(), 3);
        assert!(!ts.is_empty());
        assert_eq!(ts.timestamps(), &timestamps);
        assert_eq!(ts.values(), &values);
        assert_eq!(ts.last_timestamp(), Some(timestamps[2]));
    }

    #[test]
    fn time_series_rejects_mismatched_lengths() {
        let timestamps = spaced_timestamps(3, Duration::hours(1));
        let result = TimeSeries::new(timestamps, vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(AnomalyError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn time_series_rejects_non_increasing_timestamps() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        // Goes backward
        let result = TimeSeries::new(vec![t1, t0], vec![1.0, 2.0]);
        assert!(matches!(result, Err(AnomalyError::TimestampError(_))));

        // Duplicate
        let result = TimeSeries::new(vec![t0, t0], vec![1.0, 2.0]);
        assert!(matches!(result, Err(AnomalyError::TimestampError(_))));
    }

    #[test]
    fn time_series_slice_returns_sub_range() {
        let timestamps = spaced_timestamps(5, Duration::hours(1));
        let ts = TimeSeries::new(timestamps, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let sliced = ts.slice(1, 4).unwrap();
        assert_eq!(sliced.len(), 3);
        assert_eq!(sliced.values(), &[2.0, 3.0, 4.0]);

        assert!(ts.slice(3, 2).is_err());
        assert!(ts.slice(0, 6).is_err());
    }

    #[test]
    fn granularity_buckets_sampling_intervals() {
        let hourly = spaced_timestamps(4, Duration::hours(1));
        assert_eq!(
            Granularity::from_timestamps(&hourly).unwrap(),
            Granularity::Hour
        );

        let minutely = spaced_timestamps(4, Duration::minutes(1));
        assert_eq!(
            Granularity::from_timestamps(&minutely).unwrap(),
            Granularity::Minute
        );

        let daily = spaced_timestamps(4, Duration::days(1));
        assert_eq!(
            Granularity::from_timestamps(&daily).unwrap(),
            Granularity::Day
        );

        let secondly = spaced_timestamps(4, Duration::seconds(10));
        assert_eq!(
            Granularity::from_timestamps(&secondly).unwrap(),
            Granularity::Second
        );
    }

    #[test]
    fn granularity_rejects_sub_second_cadence() {
        let ms = spaced_timestamps(4, Duration::milliseconds(100));
        assert!(matches!(
            Granularity::from_timestamps(&ms),
            Err(AnomalyError::GranularityInference(_))
        ));
    }

    #[test]
    fn granularity_requires_two_observations() {
        let one = spaced_timestamps(1, Duration::hours(1));
        assert!(matches!(
            Granularity::from_timestamps(&one),
            Err(AnomalyError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn seasonal_period_mapping() {
        assert_eq!(Granularity::Minute.seasonal_period(), Some(1440));
        assert_eq!(Granularity::Hour.seasonal_period(), Some(24));
        assert_eq!(Granularity::Day.seasonal_period(), Some(7));
        assert_eq!(Granularity::Second.seasonal_period(), None);
    }

    #[test]
    fn resample_minutely_sums_within_buckets() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..120)
            .map(|i| base + Duration::seconds(i as i64))
            .collect();
        let values = vec![1.0; 120];

        let ts = TimeSeries::new(timestamps, values).unwrap();
        let resampled = ts.resample_minutely();

        assert_eq!(resampled.len(), 2);
        assert_eq!(resampled.values(), &[60.0, 60.0]);
        assert_eq!(resampled.timestamps()[0], base);
        assert_eq!(resampled.timestamps()[1], base + Duration::minutes(1));
        assert_eq!(
            resampled.granularity().unwrap(),
            Granularity::Minute
        );
    }
}
