//! Anomaly detection: the ESD outlier test and the detector entry points.

mod detector;
mod esd;

pub use detector::{
    detect_ts, detect_vec, Anomaly, AnomalyResult, DetectorConfig, Direction, OnlyLast, Threshold,
    VecAnomaly, VecAnomalyResult,
};
pub use esd::{esd_outliers, EsdConfig};
