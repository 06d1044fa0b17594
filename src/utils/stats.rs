//! Statistical utility functions.

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the mean of a slice, ignoring NaN entries.
///
/// Returns NaN when no finite entries are present.
pub fn mean_ignore_nan(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Median absolute deviation, scaled by 1.4826 so that it estimates the
/// standard deviation of normally distributed data.
pub fn mad(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    1.4826 * median(&deviations)
}

/// Percentile of a slice with linear interpolation between order statistics.
///
/// `p` is a fraction in [0, 1]. Matches the convention used by pandas'
/// default `quantile`.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn mean_ignore_nan_skips_missing() {
        assert_relative_eq!(
            mean_ignore_nan(&[1.0, f64::NAN, 3.0]),
            2.0,
            epsilon = 1e-10
        );
        assert!(mean_ignore_nan(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn median_calculates_correctly() {
        // Odd number of elements
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        // Even number of elements
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5, epsilon = 1e-10);
        // Unsorted input
        assert_relative_eq!(median(&[5.0, 1.0, 3.0, 2.0, 4.0]), 3.0, epsilon = 1e-10);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn mad_estimates_dispersion() {
        // Deviations from the median 3 are [2, 1, 0, 1, 2], median 1
        assert_relative_eq!(mad(&[1.0, 2.0, 3.0, 4.0, 5.0]), 1.4826, epsilon = 1e-10);
        // Constant series has zero dispersion
        assert_relative_eq!(mad(&[7.0; 10]), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 0.0), 1.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 0.5), 3.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 1.0), 5.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 0.95), 4.8, epsilon = 1e-10);
    }

    #[test]
    fn percentile_degenerate_inputs() {
        assert!(percentile(&[], 0.5).is_nan());
        assert!(percentile(&[1.0, 2.0], 1.5).is_nan());
        assert_relative_eq!(percentile(&[42.0], 0.99), 42.0, epsilon = 1e-10);
    }
}
