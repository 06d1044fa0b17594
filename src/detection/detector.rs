//! Seasonal Hybrid ESD anomaly detection.
//!
//! The detector orchestrates the full pipeline: validate parameters,
//! resolve the seasonal period from the sampling granularity, optionally
//! split long series into piecewise windows, decompose each window and run
//! the ESD test on its residual, then merge, threshold and restrict the
//! results.

use crate::core::{Granularity, TimeSeries};
use crate::detection::esd::{esd_outliers, EsdConfig};
use crate::error::{AnomalyError, Result};
use crate::seasonality::{ClassicalDecomposition, DecompositionModel, Periodicity, SeasonalKernel};
use crate::utils::stats::{median, percentile};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Directionality of the anomalies to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Only positive-going anomalies (above the seasonal pattern).
    #[default]
    Positive,
    /// Only negative-going anomalies.
    Negative,
    /// Both directions.
    Both,
}

impl Direction {
    /// Map to the ESD `(one_tail, upper_tail)` configuration.
    fn tails(self) -> (bool, bool) {
        match self {
            Direction::Positive => (true, true),
            Direction::Negative => (true, false),
            Direction::Both => (false, false),
        }
    }
}

/// Magnitude threshold applied to detected anomalies, derived from the
/// per-day (or per-period) maxima of the raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Threshold {
    /// No threshold filtering.
    #[default]
    None,
    /// Median of the maxima.
    MedMax,
    /// 95th percentile of the maxima.
    P95,
    /// 99th percentile of the maxima.
    P99,
}

impl Threshold {
    /// Compute the cutoff from a set of per-day/per-period maxima.
    fn cutoff(self, maxes: &[f64]) -> Option<f64> {
        match self {
            Threshold::None => None,
            Threshold::MedMax => Some(median(maxes)),
            Threshold::P95 => Some(percentile(maxes, 0.95)),
            Threshold::P99 => Some(percentile(maxes, 0.99)),
        }
    }
}

/// Trailing window to which reported anomalies are restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlyLast {
    Day,
    Hour,
}

/// Detector configuration.
///
/// Defaults mirror the reference behavior: up to 10% anomalies, positive
/// direction, 5% significance, no thresholding or restriction, and a
/// "periodic" (constant-seasonal, additive) decomposition.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Maximum anomalies as a fraction of the data, in (0, 0.49].
    pub max_anoms: f64,
    /// Directionality of detected anomalies.
    pub direction: Direction,
    /// Statistical significance level, in (0, 1).
    pub alpha: f64,
    /// Magnitude threshold mode.
    pub threshold: Threshold,
    /// Restrict results to the trailing day/hour (timestamped entry point).
    pub only_last: Option<OnlyLast>,
    /// Restrict results to the trailing period (vector entry point).
    pub only_last_period: bool,
    /// Attach the expected (trend plus seasonal) value to each anomaly.
    pub e_value: bool,
    /// Piecewise analysis for long series (timestamped entry point).
    pub longterm: bool,
    /// Piecewise window size in weeks when `longterm` is set; at least 2.
    pub piecewise_median_period_weeks: usize,
    /// Piecewise window size in observations (vector entry point).
    pub longterm_period: Option<usize>,
    /// Explicit seasonal period, overriding granularity inference.
    pub period: Option<usize>,
    /// Decomposition model for the seasonal removal.
    pub model: DecompositionModel,
    /// Constant ("periodic") seasonal, the reference default.
    pub constant_seasonal: bool,
    /// Seasonal smoothing kernel when the seasonal is not constant.
    pub kernel: SeasonalKernel,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_anoms: 0.10,
            direction: Direction::default(),
            alpha: 0.05,
            threshold: Threshold::default(),
            only_last: None,
            only_last_period: false,
            e_value: false,
            longterm: false,
            piecewise_median_period_weeks: 2,
            longterm_period: None,
            period: None,
            model: DecompositionModel::Additive,
            constant_seasonal: true,
            kernel: SeasonalKernel::default(),
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_anoms(mut self, max_anoms: f64) -> Self {
        self.max_anoms = max_anoms;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_only_last(mut self, only_last: OnlyLast) -> Self {
        self.only_last = Some(only_last);
        self
    }

    pub fn with_e_value(mut self, e_value: bool) -> Self {
        self.e_value = e_value;
        self
    }

    pub fn with_longterm(mut self, weeks: usize) -> Self {
        self.longterm = true;
        self.piecewise_median_period_weeks = weeks;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_anoms > 0.0 && self.max_anoms <= 0.49) {
            return Err(AnomalyError::InvalidParameter(format!(
                "max_anoms must be in (0, 0.49], got {}",
                self.max_anoms
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnomalyError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.longterm && self.piecewise_median_period_weeks < 2 {
            return Err(AnomalyError::InvalidParameter(
                "piecewise_median_period_weeks must be at least 2".to_string(),
            ));
        }
        if let Some(period) = self.period {
            if period < 2 {
                return Err(AnomalyError::InvalidParameter(
                    "period must be >= 2".to_string(),
                ));
            }
        }
        if let Some(window) = self.longterm_period {
            if window < 2 {
                return Err(AnomalyError::InvalidParameter(
                    "longterm_period must be >= 2".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A detected anomaly in a timestamped series.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// The trend-plus-seasonal value at the same timestamp, when requested.
    pub expected: Option<f64>,
}

/// Detection output for the timestamped entry point.
#[derive(Debug, Clone, Default)]
pub struct AnomalyResult {
    /// Detected anomalies, ordered by timestamp.
    pub anomalies: Vec<Anomaly>,
    /// Merged trend-plus-seasonal series for diagnostic display.
    pub seasonal_plus_trend: Vec<(DateTime<Utc>, f64)>,
}

/// A detected anomaly in an integer-indexed series.
#[derive(Debug, Clone, PartialEq)]
pub struct VecAnomaly {
    /// Index into the caller's input slice.
    pub index: usize,
    pub value: f64,
    pub expected: Option<f64>,
}

/// Detection output for the vector entry point.
#[derive(Debug, Clone, Default)]
pub struct VecAnomalyResult {
    /// Detected anomalies, ordered by index.
    pub anomalies: Vec<VecAnomaly>,
    /// Merged trend-plus-seasonal series keyed by input index.
    pub seasonal_plus_trend: Vec<(usize, f64)>,
}

/// Detect anomalies in a timestamped series.
///
/// The seasonal period is taken from `config.period` or inferred from the
/// sampling granularity (minute data carries a 1440-observation daily
/// cycle, hourly 24, daily a 7-day weekly cycle). Sub-minute data is first
/// aggregated to per-minute sums.
pub fn detect_ts(series: &TimeSeries, config: &DetectorConfig) -> Result<AnomalyResult> {
    config.validate()?;
    if series.is_empty() {
        return Err(AnomalyError::EmptyData);
    }

    let offset = leading_missing(series.values())?;
    let mut working = series.slice(offset, series.len())?;

    let mut granularity = working.granularity()?;
    if granularity == Granularity::Second {
        working = working.resample_minutely();
        granularity = Granularity::Minute;
    }
    let period = match config.period {
        Some(p) => p,
        None => granularity.seasonal_period().ok_or_else(|| {
            AnomalyError::GranularityInference("no canonical period for granularity".to_string())
        })?,
    };

    let n = working.len();
    let max_anoms = config.max_anoms.max(1.0 / n as f64);

    let windows = if config.longterm {
        let window_len = if granularity == Granularity::Day {
            period * config.piecewise_median_period_weeks + 1
        } else {
            period * 7 * config.piecewise_median_period_weeks
        };
        piecewise_windows(n, window_len)
    } else {
        vec![(0, n)]
    };

    let (one_tail, upper_tail) = config.direction.tails();
    let decomposer = ClassicalDecomposition::new(config.model)
        .with_constant_seasonal(config.constant_seasonal)
        .with_kernel(config.kernel);

    let mut all_anoms: Vec<(DateTime<Utc>, f64)> = Vec::new();
    let mut seasonal_plus_trend: Vec<(DateTime<Utc>, f64)> = Vec::new();

    for &(start, end) in &windows {
        let window = working.slice(start, end)?;
        let decomp = decomposer.decompose(window.values(), &Periodicity::Cycle(period))?;

        // Seasonally adjusted residual, centered on the window median.
        let med = median(window.values());
        let residual: Vec<f64> = decomp
            .seasonally_adjusted
            .iter()
            .map(|v| v - med)
            .collect();

        let esd_config = EsdConfig {
            max_fraction: max_anoms,
            alpha: config.alpha,
            one_tail,
            upper_tail,
        };
        for idx in esd_outliers(&residual, &esd_config)? {
            all_anoms.push((window.timestamps()[idx], window.values()[idx]));
        }
        for (idx, v) in decomp.seasonal_plus_trend().into_iter().enumerate() {
            seasonal_plus_trend.push((window.timestamps()[idx], v));
        }
    }

    dedup_by_key(&mut all_anoms);
    dedup_by_key(&mut seasonal_plus_trend);

    if let Some(cutoff) = config.threshold.cutoff(&daily_maxes(&working)) {
        all_anoms.retain(|&(_, v)| v >= cutoff);
    }

    if let Some(only_last) = config.only_last {
        let span = match only_last {
            OnlyLast::Day => Duration::days(1),
            OnlyLast::Hour => Duration::hours(1),
        };
        // last_timestamp is always present here; emptiness was rejected above
        if let Some(last) = working.last_timestamp() {
            let earliest = last - span;
            all_anoms.retain(|&(t, _)| t > earliest);
        }
    }

    all_anoms.sort_by_key(|&(t, _)| t);

    let expected: HashMap<DateTime<Utc>, f64> = if config.e_value {
        seasonal_plus_trend.iter().copied().collect()
    } else {
        HashMap::new()
    };

    let anomalies = all_anoms
        .into_iter()
        .map(|(timestamp, value)| Anomaly {
            timestamp,
            value,
            expected: if config.e_value {
                expected.get(&timestamp).copied()
            } else {
                None
            },
        })
        .collect();

    Ok(AnomalyResult {
        anomalies,
        seasonal_plus_trend,
    })
}

/// Detect anomalies in a bare numeric sequence with an explicit period.
///
/// Indices in the result refer to positions in the caller's slice. In
/// `longterm_period` mode the series is split into windows of that many
/// observations; thresholds use per-period maxima and `only_last_period`
/// restricts output to the trailing period.
pub fn detect_vec(
    values: &[f64],
    period: usize,
    config: &DetectorConfig,
) -> Result<VecAnomalyResult> {
    config.validate()?;
    if values.is_empty() {
        return Err(AnomalyError::EmptyData);
    }
    if period < 2 {
        return Err(AnomalyError::InvalidParameter(
            "period must be >= 2".to_string(),
        ));
    }

    let offset = leading_missing(values)?;
    let working = &values[offset..];
    let n = working.len();
    let max_anoms = config.max_anoms.max(1.0 / n as f64);

    let windows = match config.longterm_period {
        Some(window_len) => piecewise_windows(n, window_len),
        None => vec![(0, n)],
    };

    let (one_tail, upper_tail) = config.direction.tails();
    let decomposer = ClassicalDecomposition::new(config.model)
        .with_constant_seasonal(config.constant_seasonal)
        .with_kernel(config.kernel);

    let mut all_anoms: Vec<(usize, f64)> = Vec::new();
    let mut seasonal_plus_trend: Vec<(usize, f64)> = Vec::new();

    for &(start, end) in &windows {
        let window = &working[start..end];
        let decomp = decomposer.decompose(window, &Periodicity::Cycle(period))?;

        let med = median(window);
        let residual: Vec<f64> = decomp
            .seasonally_adjusted
            .iter()
            .map(|v| v - med)
            .collect();

        let esd_config = EsdConfig {
            max_fraction: max_anoms,
            alpha: config.alpha,
            one_tail,
            upper_tail,
        };
        for idx in esd_outliers(&residual, &esd_config)? {
            all_anoms.push((offset + start + idx, window[idx]));
        }
        for (idx, v) in decomp.seasonal_plus_trend().into_iter().enumerate() {
            seasonal_plus_trend.push((offset + start + idx, v));
        }
    }

    dedup_by_key(&mut all_anoms);
    dedup_by_key(&mut seasonal_plus_trend);

    if let Some(cutoff) = config.threshold.cutoff(&periodic_maxes(working, period)) {
        all_anoms.retain(|&(_, v)| v >= cutoff);
    }

    if config.only_last_period {
        let first_kept = offset + n.saturating_sub(period);
        all_anoms.retain(|&(i, _)| i >= first_kept);
    }

    all_anoms.sort_by_key(|&(i, _)| i);

    let expected: HashMap<usize, f64> = if config.e_value {
        seasonal_plus_trend.iter().copied().collect()
    } else {
        HashMap::new()
    };

    let anomalies = all_anoms
        .into_iter()
        .map(|(index, value)| VecAnomaly {
            index,
            value,
            expected: if config.e_value {
                expected.get(&index).copied()
            } else {
                None
            },
        })
        .collect();

    Ok(VecAnomalyResult {
        anomalies,
        seasonal_plus_trend,
    })
}

/// Count leading missing values; any later missing value is an error,
/// since the decomposition has no interpolation policy of its own.
fn leading_missing(values: &[f64]) -> Result<usize> {
    let offset = values.iter().take_while(|v| !v.is_finite()).count();
    if values[offset..].iter().any(|v| !v.is_finite()) {
        return Err(AnomalyError::MissingValues);
    }
    Ok(offset)
}

/// Consecutive windows of `window_len` observations; a short final
/// partition is replaced by the trailing full-length window so every
/// window has uniform length.
fn piecewise_windows(n: usize, window_len: usize) -> Vec<(usize, usize)> {
    if window_len >= n {
        return vec![(0, n)];
    }
    let mut windows = Vec::new();
    let mut start = 0;
    while start < n {
        if start + window_len <= n {
            windows.push((start, start + window_len));
        } else {
            windows.push((n - window_len, n));
            break;
        }
        start += window_len;
    }
    windows
}

/// Per-calendar-day maxima of the raw series.
fn daily_maxes(series: &TimeSeries) -> Vec<f64> {
    let mut maxes: Vec<f64> = Vec::new();
    let mut current_day = None;
    for (&t, &v) in series.timestamps().iter().zip(series.values().iter()) {
        let day = t.date_naive();
        if current_day == Some(day) {
            let idx = maxes.len() - 1;
            maxes[idx] = maxes[idx].max(v);
        } else {
            current_day = Some(day);
            maxes.push(v);
        }
    }
    maxes
}

/// Maxima over consecutive period-sized chunks.
fn periodic_maxes(values: &[f64], period: usize) -> Vec<f64> {
    values
        .chunks(period)
        .map(|chunk| chunk.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
        .collect()
}

/// Remove later duplicates by key, keeping the first occurrence.
fn dedup_by_key<K: std::hash::Hash + Eq + Copy>(rows: &mut Vec<(K, f64)>) {
    let mut seen: HashSet<K> = HashSet::with_capacity(rows.len());
    rows.retain(|&(k, _)| seen.insert(k));
}
