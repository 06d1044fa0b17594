//! Error types for the anofox-anomaly library.

use thiserror::Error;

/// Result type alias for anomaly detection operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;

/// Errors that can occur during decomposition or anomaly detection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnomalyError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Non-leading missing values detected in the series.
    #[error("series contains non-leading missing values")]
    MissingValues,

    /// Sampling granularity could not be inferred.
    #[error("could not infer granularity: {0}")]
    GranularityInference(String),

    /// Computation error (e.g. numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnomalyError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = AnomalyError::InsufficientData { needed: 49, got: 10 };
        assert_eq!(err.to_string(), "insufficient data: need at least 49, got 10");

        let err = AnomalyError::InvalidParameter("period must be >= 2".to_string());
        assert_eq!(err.to_string(), "invalid parameter: period must be >= 2");

        let err = AnomalyError::MissingValues;
        assert_eq!(err.to_string(), "series contains non-leading missing values");

        let err = AnomalyError::GranularityInference("sub-second cadence".to_string());
        assert_eq!(
            err.to_string(),
            "could not infer granularity: sub-second cadence"
        );
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = AnomalyError::MissingValues;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
