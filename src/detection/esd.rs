//! Generalized ESD (extreme Studentized deviate) outlier testing.
//!
//! Operates on a seasonally adjusted, median-centered residual. Each
//! iteration removes the most extreme remaining point (by median/MAD
//! distance) and compares its studentized deviation against a critical
//! value from the Student t-distribution; the accepted anomaly count is
//! the last iteration at which the test passed.

use crate::error::{AnomalyError, Result};
use crate::utils::stats::{mad, median};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Configuration for the ESD test.
#[derive(Debug, Clone, Copy)]
pub struct EsdConfig {
    /// Upper bound on flagged points as a fraction of the series length,
    /// in (0, 0.5).
    pub max_fraction: f64,
    /// Nominal Type-I error rate, in (0, 1).
    pub alpha: f64,
    /// Restrict detection to a single tail.
    pub one_tail: bool,
    /// Which tail, when `one_tail` is set: `true` flags points above the
    /// median, `false` below.
    pub upper_tail: bool,
}

impl Default for EsdConfig {
    fn default() -> Self {
        Self {
            max_fraction: 0.10,
            alpha: 0.05,
            one_tail: true,
            upper_tail: true,
        }
    }
}

/// Run the generalized ESD test over a residual series.
///
/// Returns the indices of accepted outliers in detection order (most
/// extreme first). An empty result means no point exceeded its critical
/// value; a zero-dispersion series terminates the search early.
pub fn esd_outliers(values: &[f64], config: &EsdConfig) -> Result<Vec<usize>> {
    if !(config.max_fraction > 0.0 && config.max_fraction < 0.5) {
        return Err(AnomalyError::InvalidParameter(format!(
            "max_fraction must be in (0, 0.5), got {}",
            config.max_fraction
        )));
    }
    if !(config.alpha > 0.0 && config.alpha < 1.0) {
        return Err(AnomalyError::InvalidParameter(format!(
            "alpha must be in (0, 1), got {}",
            config.alpha
        )));
    }
    if values.is_empty() {
        return Err(AnomalyError::EmptyData);
    }

    let n = values.len();
    let max_outliers = (n as f64 * config.max_fraction).floor() as usize;
    if max_outliers == 0 {
        return Err(AnomalyError::InsufficientData {
            needed: (1.0 / config.max_fraction).ceil() as usize,
            got: n,
        });
    }

    // Working set of (original index, value); shrinks by one per iteration.
    let mut working: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    let mut candidates: Vec<usize> = Vec::with_capacity(max_outliers);
    let mut num_anoms = 0;

    for i in 1..=max_outliers {
        let current: Vec<f64> = working.iter().map(|(_, v)| *v).collect();
        let med = median(&current);
        let sigma = mad(&current);
        if sigma == 0.0 {
            break;
        }

        // Studentized deviation toward the configured tail.
        let mut best_pos = 0;
        let mut best_dev = f64::NEG_INFINITY;
        for (pos, &(_, v)) in working.iter().enumerate() {
            let dev = if config.one_tail {
                if config.upper_tail {
                    v - med
                } else {
                    med - v
                }
            } else {
                (v - med).abs()
            };
            if dev > best_dev {
                best_dev = dev;
                best_pos = pos;
            }
        }
        let r = best_dev / sigma;

        // The candidate is removed whether or not the test accepts it;
        // acceptance is decided retroactively below.
        let (orig_idx, _) = working.remove(best_pos);
        candidates.push(orig_idx);

        let denominator = if config.one_tail {
            (n - i + 1) as f64
        } else {
            2.0 * (n - i + 1) as f64
        };
        let p = 1.0 - config.alpha / denominator;
        let df = (n - i - 1) as f64;
        let t_dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| AnomalyError::ComputationError(e.to_string()))?;
        let t = t_dist.inverse_cdf(p);

        let lambda = t * (n - i) as f64
            / (((n - i - 1) as f64 + t * t) * (n - i + 1) as f64).sqrt();

        if r > lambda {
            num_anoms = i;
        }
    }

    candidates.truncate(num_anoms);
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic bounded noise around zero.
    fn noise(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (7.3 * i as f64).sin() + 0.5 * (13.7 * i as f64).sin())
            .collect()
    }

    #[test]
    fn detects_injected_spikes() {
        let mut residual = noise(200);
        residual[40] = 15.0;
        residual[120] = 18.0;

        let config = EsdConfig {
            one_tail: false,
            ..EsdConfig::default()
        };
        let flagged = esd_outliers(&residual, &config).unwrap();

        assert_eq!(flagged.len(), 2);
        // Most extreme first
        assert_eq!(flagged[0], 120);
        assert_eq!(flagged[1], 40);
    }

    #[test]
    fn clean_noise_yields_no_outliers() {
        let residual = noise(300);
        let config = EsdConfig {
            one_tail: false,
            ..EsdConfig::default()
        };
        assert!(esd_outliers(&residual, &config).unwrap().is_empty());
    }

    #[test]
    fn constant_series_terminates_early_and_empty() {
        let residual = vec![3.0; 100];
        let flagged = esd_outliers(&residual, &EsdConfig::default()).unwrap();
        assert!(flagged.is_empty());
    }

    #[test]
    fn upper_tail_ignores_negative_spikes() {
        let mut residual = noise(200);
        residual[50] = -20.0;
        residual[150] = 20.0;

        let upper = EsdConfig {
            one_tail: true,
            upper_tail: true,
            ..EsdConfig::default()
        };
        let flagged = esd_outliers(&residual, &upper).unwrap();
        assert_eq!(flagged, vec![150]);

        let lower = EsdConfig {
            one_tail: true,
            upper_tail: false,
            ..EsdConfig::default()
        };
        let flagged = esd_outliers(&residual, &lower).unwrap();
        assert_eq!(flagged, vec![50]);
    }

    #[test]
    fn direction_symmetry_under_negation() {
        let mut residual = noise(200);
        residual[10] = 12.0;
        residual[90] = 17.0;
        let negated: Vec<f64> = residual.iter().map(|v| -v).collect();

        let upper = EsdConfig {
            one_tail: true,
            upper_tail: true,
            ..EsdConfig::default()
        };
        let lower = EsdConfig {
            one_tail: true,
            upper_tail: false,
            ..EsdConfig::default()
        };

        let a = esd_outliers(&residual, &upper).unwrap();
        let b = esd_outliers(&negated, &lower).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn flag_count_never_exceeds_cap() {
        // Every point extreme relative to its neighbours
        let residual: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 50.0 } else { -50.0 }).collect();
        let config = EsdConfig {
            max_fraction: 0.05,
            one_tail: false,
            ..EsdConfig::default()
        };
        let flagged = esd_outliers(&residual, &config).unwrap();
        assert!(flagged.len() <= 5);
    }

    #[test]
    fn increasing_cap_never_decreases_detections() {
        let mut residual = noise(200);
        residual[20] = 14.0;
        residual[60] = 16.0;
        residual[110] = 13.0;

        let mut previous = 0;
        for fraction in [0.02, 0.05, 0.1, 0.2] {
            let config = EsdConfig {
                max_fraction: fraction,
                one_tail: false,
                ..EsdConfig::default()
            };
            let count = esd_outliers(&residual, &config).unwrap().len();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn zero_cap_is_rejected() {
        let residual = noise(5);
        let config = EsdConfig {
            max_fraction: 0.1,
            ..EsdConfig::default()
        };
        assert!(matches!(
            esd_outliers(&residual, &config),
            Err(AnomalyError::InsufficientData { .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let residual = noise(50);

        let config = EsdConfig {
            max_fraction: 0.6,
            ..EsdConfig::default()
        };
        assert!(matches!(
            esd_outliers(&residual, &config),
            Err(AnomalyError::InvalidParameter(_))
        ));

        let config = EsdConfig {
            alpha: 0.0,
            ..EsdConfig::default()
        };
        assert!(matches!(
            esd_outliers(&residual, &config),
            Err(AnomalyError::InvalidParameter(_))
        ));

        assert!(matches!(
            esd_outliers(&[], &EsdConfig::default()),
            Err(AnomalyError::EmptyData)
        ));
    }
}
