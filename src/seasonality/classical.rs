//! Classical seasonal-trend-irregular decomposition.
//!
//! Splits a seasonally periodic series into Trend, Seasonal and Irregular
//! components through an iterative smoothing pipeline: a centered moving
//! average gives a first trend, the seasonal is estimated per phase and
//! smoothed across cycles, then the trend is refined twice with a Henderson
//! filter. Undefined points are represented as NaN.

use crate::error::{AnomalyError, Result};
use crate::seasonality::kernels::{henderson, SeasonalKernel};
use crate::utils::stats::{mean, mean_ignore_nan};
use std::collections::HashMap;

/// How the components combine to reproduce the original series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionModel {
    /// `Original = Trend * Seasonal * Irregular`.
    #[default]
    Multiplicative,
    /// `Original = Trend + Seasonal + Irregular`.
    Additive,
}

impl DecompositionModel {
    /// Combine two components under this model.
    fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            DecompositionModel::Multiplicative => a * b,
            DecompositionModel::Additive => a + b,
        }
    }

    /// Remove component `b` from `a` (the inverse of [`combine`]).
    fn combine_inverse(self, a: f64, b: f64) -> f64 {
        match self {
            DecompositionModel::Multiplicative => a / b,
            DecompositionModel::Additive => a - b,
        }
    }
}

/// Assignment of observations to phases of the seasonal cycle.
#[derive(Debug, Clone)]
pub enum Periodicity {
    /// A fixed cycle length; observation `i` belongs to phase `i % period`.
    Cycle(usize),
    /// An explicit phase label per observation; the period is the number of
    /// distinct labels.
    Labels(Vec<usize>),
}

impl Periodicity {
    /// Resolve to `(period, per-observation phase labels)` for a series of
    /// length `n`.
    fn resolve(&self, n: usize) -> Result<(usize, Vec<usize>)> {
        match self {
            Periodicity::Cycle(period) => {
                Ok((*period, (0..n).map(|i| i % period.max(&1)).collect()))
            }
            Periodicity::Labels(labels) => {
                if labels.len() != n {
                    return Err(AnomalyError::DimensionMismatch {
                        expected: n,
                        got: labels.len(),
                    });
                }
                let mut distinct = labels.clone();
                distinct.sort_unstable();
                distinct.dedup();
                Ok((distinct.len(), labels.clone()))
            }
        }
    }
}

/// Result of a classical decomposition: five series aligned to the input.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// The input series.
    pub original: Vec<f64>,
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Irregular (residual) component.
    pub irregular: Vec<f64>,
    /// Original with the seasonal component removed.
    pub seasonally_adjusted: Vec<f64>,
    model: DecompositionModel,
}

impl Decomposition {
    /// The combined trend-and-seasonal series, i.e. what the decomposition
    /// "expected" at each index.
    pub fn seasonal_plus_trend(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(self.seasonal.iter())
            .map(|(&t, &s)| self.model.combine(t, s))
            .collect()
    }
}

/// Classical decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct ClassicalDecomposition {
    model: DecompositionModel,
    constant_seasonal: bool,
    kernel: SeasonalKernel,
}

impl ClassicalDecomposition {
    /// Create a decomposer for the given model, with a slowly-varying
    /// seasonal smoothed by the default kernel.
    pub fn new(model: DecompositionModel) -> Self {
        Self {
            model,
            constant_seasonal: false,
            kernel: SeasonalKernel::default(),
        }
    }

    /// Use a constant seasonal: each phase takes its historical mean
    /// instead of a slowly-varying smoothed curve.
    pub fn with_constant_seasonal(mut self, constant: bool) -> Self {
        self.constant_seasonal = constant;
        self
    }

    /// Select the seasonal smoothing kernel (ignored when the seasonal is
    /// constant).
    pub fn with_kernel(mut self, kernel: SeasonalKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Decompose a series into trend, seasonal and irregular components.
    pub fn decompose(&self, series: &[f64], periodicity: &Periodicity) -> Result<Decomposition> {
        if series.is_empty() {
            return Err(AnomalyError::EmptyData);
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::MissingValues);
        }

        let n = series.len();
        let (period, phases) = periodicity.resolve(n)?;
        if period < 2 {
            return Err(AnomalyError::InvalidParameter(
                "period must be >= 2".to_string(),
            ));
        }
        if n < 2 * period + 1 {
            return Err(AnomalyError::InsufficientData {
                needed: 2 * period + 1,
                got: n,
            });
        }

        // Henderson span: at least 7 terms, forced odd.
        let mut h = period.max(7);
        if h % 2 == 0 {
            h += 1;
        }

        // 1. Initial trend from a centered moving average over one cycle.
        let trend1 = centered_mean(series, period + 1);

        // 2. Preliminary seasonal estimate.
        let seasonal1 = self.remove(series, &trend1);

        // 3. Smooth the seasonal per phase.
        let seasonal2 = self.smooth_seasonal(&seasonal1, &phases);

        // 4. Extend the smoothed seasonal over the undefined head and tail.
        let seasonal3 = if seasonal2.iter().any(|v| v.is_nan()) {
            extend_seasonal(&seasonal2, &phases, period)
        } else {
            seasonal2
        };

        // 5. Preliminary seasonally adjusted series.
        let adjusted1 = self.remove(series, &seasonal3);

        // 6. Refined trend from the Henderson filter.
        let trend2 = henderson(&adjusted1, h)?;

        // 7-8. Final seasonal estimate, smoothed again.
        let seasonal4 = self.remove(series, &trend2);
        let seasonal = self.smooth_seasonal(&seasonal4, &phases);

        // 9. Final seasonally adjusted series.
        let seasonally_adjusted = self.remove(series, &seasonal);

        // 10. Final trend.
        let trend = henderson(&seasonally_adjusted, h)?;

        // 11. Final irregular.
        let irregular = self.remove(&seasonally_adjusted, &trend);

        Ok(Decomposition {
            original: series.to_vec(),
            trend,
            seasonal,
            irregular,
            seasonally_adjusted,
            model: self.model,
        })
    }

    /// Element-wise removal of component `b` from `a` under the model.
    fn remove(&self, a: &[f64], b: &[f64]) -> Vec<f64> {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| self.model.combine_inverse(x, y))
            .collect()
    }

    /// Smooth a seasonal estimate phase by phase.
    ///
    /// For each phase the defined values are collected in series order and
    /// either averaged (constant seasonal) or smoothed with the kernel's
    /// central weights; the first and last `order - 1` occurrences, where
    /// the symmetric window does not fit, use the kernel's asymmetric end
    /// rows (reversed at the start of the sequence). A phase whose smoothed
    /// values are all undefined falls back to its simple mean.
    fn smooth_seasonal(&self, values: &[f64], phases: &[usize]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        let mut seen: Vec<usize> = Vec::new();
        for &phase in phases {
            if !seen.contains(&phase) {
                seen.push(phase);
            }
        }

        for &phase in &seen {
            let indices: Vec<usize> = (0..n).filter(|&i| phases[i] == phase).collect();

            if self.constant_seasonal {
                let phase_values: Vec<f64> = indices.iter().map(|&i| values[i]).collect();
                let m = mean_ignore_nan(&phase_values);
                for &i in &indices {
                    result[i] = m;
                }
                continue;
            }

            // Drop undefined values left by the initial trend estimate.
            let kept: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| !values[i].is_nan())
                .collect();
            let sub: Vec<f64> = kept.iter().map(|&i| values[i]).collect();
            let len = sub.len();
            if len == 0 {
                continue;
            }

            let k = self.kernel.order();
            let span = 2 * k - 1;
            let central = self.kernel.central_weights();
            let rows = self.kernel.end_weights();

            let mut smoothed = vec![f64::NAN; len];
            if len >= span {
                for i in (k - 1)..=(len - k) {
                    smoothed[i] = dot(&sub[i - (k - 1)..=i + (k - 1)], central);
                }

                // End-point rows: reversed at the start, as published at
                // the end.
                for i in 0..k - 1 {
                    if smoothed[i].is_nan() {
                        smoothed[i] = dot_reversed(&sub[0..i + k], rows[i]);
                    }
                }
                for i in (len - k + 1)..len {
                    if smoothed[i].is_nan() {
                        smoothed[i] = dot(&sub[i - (k - 1)..len], rows[len - 1 - i]);
                    }
                }
            } else {
                // Too few cycles for the kernel; use the phase mean.
                let m = mean(&sub);
                smoothed.fill(m);
            }

            for (pos, &i) in kept.iter().enumerate() {
                result[i] = smoothed[pos];
            }
        }

        result
    }
}

/// Centered moving average of the given window size; NaN where the full
/// window does not fit. For an even window the extra point sits on the
/// left, matching the usual centered-rolling convention.
fn centered_mean(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let hi = (window - 1) / 2;
    let lo = window - 1 - hi;

    (0..n)
        .map(|i| {
            if i >= lo && i + hi < n {
                mean(&series[i - lo..=i + hi])
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Back- and forward-cast an incomplete seasonal over its undefined head
/// and tail, copying the nearest complete set of phase values.
fn extend_seasonal(values: &[f64], phases: &[usize], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = values.to_vec();
    let defined: Vec<usize> = (0..n).filter(|&i| !values[i].is_nan()).collect();
    if defined.is_empty() {
        return result;
    }

    if result[0].is_nan() {
        let fill: HashMap<usize, f64> = defined
            .iter()
            .take(period)
            .map(|&i| (phases[i], values[i]))
            .collect();
        for i in 0..defined[0] {
            if let Some(&v) = fill.get(&phases[i]) {
                result[i] = v;
            }
        }
    }

    if result[n - 1].is_nan() {
        let fill: HashMap<usize, f64> = defined
            .iter()
            .rev()
            .take(period)
            .map(|&i| (phases[i], values[i]))
            .collect();
        for i in (defined[defined.len() - 1] + 1)..n {
            if let Some(&v) = fill.get(&phases[i]) {
                result[i] = v;
            }
        }
    }

    result
}

fn dot(values: &[f64], weights: &[f64]) -> f64 {
    values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum()
}

fn dot_reversed(values: &[f64], weights: &[f64]) -> f64 {
    values
        .iter()
        .zip(weights.iter().rev())
        .map(|(v, w)| v * w)
        .sum()
}
