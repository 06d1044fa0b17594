//! Core data structures for anomaly detection.

mod time_series;

pub use time_series::{Granularity, TimeSeries};
