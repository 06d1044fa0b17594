//! # anofox-anomaly
//!
//! Anomaly detection for seasonal univariate time series.
//!
//! Implements the Seasonal Hybrid ESD method: a classical seasonal-trend
//! decomposition removes the repeating pattern and long-run trend, and a
//! robust generalized ESD test flags the remaining extreme points. Entry
//! points cover timestamped series with granularity inference
//! ([`detection::detect_ts`]) and bare numeric sequences with an explicit
//! period ([`detection::detect_vec`]).

#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod detection;
pub mod error;
pub mod seasonality;
pub mod utils;

pub use error::{AnomalyError, Result};

pub mod prelude {
    pub use crate::core::{Granularity, TimeSeries};
    pub use crate::detection::{
        detect_ts, detect_vec, Anomaly, AnomalyResult, DetectorConfig, Direction, OnlyLast,
        Threshold, VecAnomaly, VecAnomalyResult,
    };
    pub use crate::error::{AnomalyError, Result};
    pub use crate::seasonality::{ClassicalDecomposition, DecompositionModel, Periodicity};
}
