//! Fixed smoothing-kernel weight tables.
//!
//! Two kernel families are provided:
//! - the symmetric Henderson moving average used for trend extraction,
//!   computed in closed form for any odd span;
//! - three weighted moving-average kernels of increasing support used for
//!   seasonal smoothing, each carrying published asymmetric end-weight rows.

use crate::error::{AnomalyError, Result};

// Seasonal end-weight rows. Row `i` holds the weights applied to the last
// `order + i` values of a phase subseries; rows are reversed when applied
// at the start. The final row is the full symmetric window.
const S3X3: [&[f64]; 3] = [
    &[5.0 / 27.0, 11.0 / 27.0, 11.0 / 27.0],
    &[3.0 / 27.0, 7.0 / 27.0, 10.0 / 27.0, 7.0 / 27.0],
    &[1.0 / 9.0, 2.0 / 9.0, 3.0 / 9.0, 2.0 / 9.0, 1.0 / 9.0],
];

const S3X5: [&[f64]; 4] = [
    &[9.0 / 60.0, 17.0 / 60.0, 17.0 / 60.0, 17.0 / 60.0],
    &[4.0 / 60.0, 11.0 / 60.0, 15.0 / 60.0, 15.0 / 60.0, 15.0 / 60.0],
    &[
        4.0 / 60.0,
        8.0 / 60.0,
        13.0 / 60.0,
        13.0 / 60.0,
        13.0 / 60.0,
        9.0 / 60.0,
    ],
    &[
        1.0 / 15.0,
        2.0 / 15.0,
        3.0 / 15.0,
        3.0 / 15.0,
        3.0 / 15.0,
        2.0 / 15.0,
        1.0 / 15.0,
    ],
];

const S3X9: [&[f64]; 6] = [
    &[0.051, 0.112, 0.173, 0.197, 0.221, 0.246],
    &[0.028, 0.092, 0.144, 0.160, 0.176, 0.192, 0.208],
    &[0.032, 0.079, 0.123, 0.133, 0.143, 0.154, 0.163, 0.173],
    &[0.034, 0.075, 0.113, 0.117, 0.123, 0.128, 0.132, 0.137, 0.141],
    &[
        0.034, 0.073, 0.111, 0.113, 0.114, 0.116, 0.117, 0.118, 0.120, 0.084,
    ],
    &[
        1.0 / 27.0,
        2.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        3.0 / 27.0,
        2.0 / 27.0,
        1.0 / 27.0,
    ],
];

/// Seasonal moving-average kernel, by increasing support.
///
/// `S3x5` (the default elsewhere) smooths each phase over seven cycles and
/// suits monthly or quarterly data; `S3x3` reacts faster, `S3x9` is the
/// most stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalKernel {
    S3x3,
    #[default]
    S3x5,
    S3x9,
}

impl SeasonalKernel {
    /// End-weight rows for this kernel.
    pub fn end_weights(self) -> &'static [&'static [f64]] {
        match self {
            SeasonalKernel::S3x3 => &S3X3,
            SeasonalKernel::S3x5 => &S3X5,
            SeasonalKernel::S3x9 => &S3X9,
        }
    }

    /// Number of end-weight rows; the symmetric window spans `2 * order - 1`.
    pub fn order(self) -> usize {
        self.end_weights().len()
    }

    /// The full symmetric central row, of length `2 * order - 1`.
    pub fn central_weights(self) -> &'static [f64] {
        let rows = self.end_weights();
        rows[rows.len() - 1]
    }
}

/// Symmetric Henderson moving-average weights for an odd filter length.
///
/// Uses the classical closed form: with `p = (len - 1) / 2` and
/// `m = p + 2`, the weight at offset `j` is
/// `315 ((m-1)^2 - j^2)(m^2 - j^2)((m+1)^2 - j^2)(3m^2 - 16 - 11 j^2)`
/// over `8 m (m^2 - 1)(4 m^2 - 1)(4 m^2 - 9)(4 m^2 - 25)`.
pub fn henderson_weights(len: usize) -> Result<Vec<f64>> {
    if len < 3 || len % 2 == 0 {
        return Err(AnomalyError::InvalidParameter(format!(
            "Henderson filter length must be odd and >= 3, got {len}"
        )));
    }

    let p = (len as i64 - 1) / 2;
    let m = (p + 2) as f64;
    let denom = 8.0 * m * (m * m - 1.0) * (4.0 * m * m - 1.0) * (4.0 * m * m - 9.0)
        * (4.0 * m * m - 25.0);

    let weights = (-p..=p)
        .map(|j| {
            let j2 = (j * j) as f64;
            let numer = 315.0
                * ((m - 1.0) * (m - 1.0) - j2)
                * (m * m - j2)
                * ((m + 1.0) * (m + 1.0) - j2)
                * (3.0 * m * m - 16.0 - 11.0 * j2);
            numer / denom
        })
        .collect();

    Ok(weights)
}

/// Apply a centered Henderson filter of the given odd length.
///
/// Where the full symmetric window does not fit (the first and last
/// `len / 2` points), the weights are truncated to the available span and
/// renormalised to sum to one, so the output is defined at every index.
pub fn henderson(series: &[f64], len: usize) -> Result<Vec<f64>> {
    let weights = henderson_weights(len)?;
    let half = len / 2;
    let n = series.len();

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let w_lo = half + lo - i;
        let w_hi = w_lo + (hi - lo);

        let window = &weights[w_lo..w_hi];
        let w_sum: f64 = window.iter().sum();
        let value: f64 = series[lo..hi]
            .iter()
            .zip(window.iter())
            .map(|(v, w)| v * w)
            .sum();
        result.push(value / w_sum);
    }

    Ok(result)
}
