//! Shared numeric helpers.

pub mod stats;

pub use stats::{mad, mean, median, percentile};
