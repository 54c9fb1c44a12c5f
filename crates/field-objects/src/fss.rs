//! Fractions skill score.
//!
//! Both fields are clipped to [0, 1], smoothed with a `window × window` box
//! filter (zero padding outside the grid, always divided by `window²`) and
//! compared:
//!
//! ```text
//! FSS = 1 - mean((f_pred - f_obs)²) / (mean(f_pred² + f_obs²) + 1e-8)
//! ```
//!
//! FSS is 1 for identical non-empty fields and tends to 0 when the smoothed
//! fields do not overlap. When both fields are empty the ε term makes the
//! score exactly 1; with nearly empty inputs ε dominates and the score is not
//! bounded below by 0. Both cases are left as the formula gives them.
//!
//! Fields must already share a grid; nothing is resampled here.

use crate::error::{FieldObjectsError, Result};
use crate::types::Grid2D;

/// Keeps the denominator positive for two empty fields.
const FSS_EPSILON: f64 = 1e-8;

/// Fractions skill score of `pred` against `obs` at neighbourhood `window`.
///
/// NaN cells count as zero coverage.
///
/// # Errors
///
/// * [`FieldObjectsError::ShapeMismatch`] if the fields differ in shape.
/// * [`FieldObjectsError::InvalidWindow`] if `window` is zero or even.
pub fn fss(pred: &Grid2D<f32>, obs: &Grid2D<f32>, window: usize) -> Result<f64> {
    if pred.shape() != obs.shape() {
        return Err(FieldObjectsError::shape_mismatch(pred.shape(), obs.shape()));
    }
    if window == 0 || window % 2 == 0 {
        return Err(FieldObjectsError::InvalidWindow(window));
    }
    if pred.is_empty() {
        return Err(FieldObjectsError::invalid_data("FSS of an empty grid"));
    }

    let f_pred = box_filter(&clip_unit(pred), window);
    let f_obs = box_filter(&clip_unit(obs), window);

    let n = f_pred.len() as f64;
    let (mut num, mut den) = (0.0, 0.0);
    for (&p, &o) in f_pred.as_slice().iter().zip(f_obs.as_slice()) {
        num += (p - o) * (p - o);
        den += p * p + o * o;
    }

    Ok(1.0 - (num / n) / (den / n + FSS_EPSILON))
}

/// [`fss`] at several neighbourhood sizes, in the order given.
pub fn fss_multi(
    pred: &Grid2D<f32>,
    obs: &Grid2D<f32>,
    windows: &[usize],
) -> Result<Vec<(usize, f64)>> {
    windows
        .iter()
        .map(|&w| fss(pred, obs, w).map(|score| (w, score)))
        .collect()
}

/// 1.0 where `field >= threshold`, else 0.0 (NaN gives 0.0).
pub fn exceedance_fraction(field: &Grid2D<f32>, threshold: f64) -> Grid2D<f32> {
    field.map(|v| if f64::from(v) >= threshold { 1.0 } else { 0.0 })
}

fn clip_unit(field: &Grid2D<f32>) -> Grid2D<f64> {
    field.map(|v| {
        if v.is_nan() {
            0.0
        } else {
            f64::from(v).clamp(0.0, 1.0)
        }
    })
}

/// Zero-padded moving average over a `window × window` square.
///
/// Uses a summed-area table, so cost does not depend on `window`.
pub fn box_filter(values: &Grid2D<f64>, window: usize) -> Grid2D<f64> {
    let (height, width) = values.shape();
    let stride = width + 1;

    // sat[(r, c)] = sum of values[..r, ..c]
    let mut sat = vec![0.0; (height + 1) * stride];
    for row in 0..height {
        let mut row_sum = 0.0;
        for col in 0..width {
            row_sum += values.at(row, col);
            sat[(row + 1) * stride + col + 1] = sat[row * stride + col + 1] + row_sum;
        }
    }

    let half = window / 2;
    let norm = (window * window) as f64;
    Grid2D::from_fn(height, width, |row, col| {
        let r0 = row.saturating_sub(half);
        let c0 = col.saturating_sub(half);
        let r1 = (row + half + 1).min(height);
        let c1 = (col + half + 1).min(width);
        let sum = sat[r1 * stride + c1] - sat[r0 * stride + c1] - sat[r1 * stride + c0]
            + sat[r0 * stride + c0];
        sum / norm
    })
}
