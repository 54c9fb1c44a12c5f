//! Shape descriptors from the area-weighted covariance ellipse.

use nalgebra::Matrix2;

/// Guards the axis ratios against collinear components.
const SHAPE_EPSILON: f64 = 1e-12;

/// Elongation and eccentricity of a set of weighted points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptors {
    /// Major over minor axis of the covariance ellipse (≥ 1).
    pub elongation: f64,
    /// `sqrt(1 - minor² / major²)`, 0 for a circle, → 1 for a line.
    pub eccentricity: f64,
}

impl ShapeDescriptors {
    /// Descriptors of a single cell or a region without extent.
    pub const DEGENERATE: Self = Self {
        elongation: 1.0,
        eccentricity: 0.0,
    };

    /// Compute descriptors for points `(lat, lon)` with weights.
    ///
    /// Fewer than two points give [`ShapeDescriptors::DEGENERATE`].
    pub fn from_weighted_points(points: &[(f64, f64)], weights: &[f64]) -> Self {
        if points.len() < 2 {
            return Self::DEGENERATE;
        }

        let cov = weighted_covariance(points, weights);
        let eigenvalues = cov.symmetric_eigenvalues();
        let (hi, lo) = if eigenvalues[0] >= eigenvalues[1] {
            (eigenvalues[0], eigenvalues[1])
        } else {
            (eigenvalues[1], eigenvalues[0])
        };

        let major = hi.max(0.0).sqrt();
        let minor = lo.max(0.0).sqrt();

        Self {
            elongation: major / (minor + SHAPE_EPSILON),
            eccentricity: (1.0 - minor * minor / (major * major + SHAPE_EPSILON))
                .max(0.0)
                .sqrt(),
        }
    }
}

/// Weighted 2×2 covariance of `(lat, lon)` points.
///
/// Normalised by `V1 - V2 / V1` (unbiased for reliability weights), or by
/// `V1` when that is not positive. The choice only scales the matrix.
pub fn weighted_covariance(points: &[(f64, f64)], weights: &[f64]) -> Matrix2<f64> {
    let v1: f64 = weights.iter().sum();
    let v2: f64 = weights.iter().map(|w| w * w).sum();
    if v1 <= 0.0 || !v1.is_finite() {
        return Matrix2::zeros();
    }

    let (mut mean_lat, mut mean_lon) = (0.0, 0.0);
    for (&(lat, lon), &w) in points.iter().zip(weights) {
        mean_lat += w * lat;
        mean_lon += w * lon;
    }
    mean_lat /= v1;
    mean_lon /= v1;

    let (mut s_aa, mut s_ab, mut s_bb) = (0.0, 0.0, 0.0);
    for (&(lat, lon), &w) in points.iter().zip(weights) {
        let da = lat - mean_lat;
        let db = lon - mean_lon;
        s_aa += w * da * da;
        s_ab += w * da * db;
        s_bb += w * db * db;
    }

    let unbiased = v1 - v2 / v1;
    let norm = if unbiased > 0.0 { unbiased } else { v1 };
    Matrix2::new(s_aa, s_ab, s_ab, s_bb) / norm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point_is_degenerate() {
        let d = ShapeDescriptors::from_weighted_points(&[(1.0, 2.0)], &[5.0]);
        assert_eq!(d, ShapeDescriptors::DEGENERATE);
    }

    #[test]
    fn test_square_is_round() {
        let points = [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)];
        let d = ShapeDescriptors::from_weighted_points(&points, &[1.0; 4]);
        assert!((d.elongation - 1.0).abs() < 1e-9);
        assert!(d.eccentricity < 1e-5);
    }

    #[test]
    fn test_line_is_elongated() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (0.0, i as f64)).collect();
        let d = ShapeDescriptors::from_weighted_points(&points, &[1.0; 10]);
        assert!(d.elongation > 1e6);
        assert!((d.eccentricity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rectangle_axis_ratio() {
        // 2 x 6 block of unit cells: variances 1/4 and 35/12 (up to a common factor).
        let points: Vec<(f64, f64)> = (0..2)
            .flat_map(|r| (0..6).map(move |c| (r as f64, c as f64)))
            .collect();
        let d = ShapeDescriptors::from_weighted_points(&points, &[1.0; 12]);
        let expected = ((35.0 / 12.0) / 0.25_f64).sqrt();
        assert!((d.elongation - expected).abs() < 1e-9);
        assert!(d.eccentricity > 0.9 && d.eccentricity < 1.0);
    }

    #[test]
    fn test_covariance_matches_unweighted_sample_covariance() {
        let points = [(0.0, 0.0), (1.0, 2.0), (2.0, 4.0)];
        let cov = weighted_covariance(&points, &[1.0; 3]);
        // Equal weights reduce to the n-1 sample covariance.
        assert!((cov[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((cov[(0, 1)] - 2.0).abs() < 1e-12);
        assert!((cov[(1, 1)] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights() {
        let cov = weighted_covariance(&[(0.0, 0.0), (1.0, 1.0)], &[0.0, 0.0]);
        assert_eq!(cov, Matrix2::zeros());
    }
}
