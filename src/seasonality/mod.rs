//! Seasonal-trend decomposition.

mod classical;
mod kernels;

pub use classical::{ClassicalDecomposition, Decomposition, DecompositionModel, Periodicity};
pub use kernels::{henderson, henderson_weights, SeasonalKernel};
