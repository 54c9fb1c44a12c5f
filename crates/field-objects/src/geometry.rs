//! Finite-difference and cell-area helpers on the sphere.

use crate::types::Grid2D;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Axis along which a finite difference is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Down the rows (axis 0).
    Rows,
    /// Across the columns (axis 1).
    Cols,
}

/// Spacing between neighbouring samples along `axis`.
///
/// Interior cells use the centred difference `(f[i+1] - f[i-1]) / 2`; the
/// first and last cells use one-sided differences. An axis with a single
/// sample has zero spacing.
pub fn gradient(values: &Grid2D<f64>, axis: Axis) -> Grid2D<f64> {
    let (height, width) = values.shape();
    let n = match axis {
        Axis::Rows => height,
        Axis::Cols => width,
    };

    Grid2D::from_fn(height, width, |row, col| {
        if n < 2 {
            return 0.0;
        }
        let i = match axis {
            Axis::Rows => row,
            Axis::Cols => col,
        };
        let sample = |k: usize| match axis {
            Axis::Rows => values.at(k, col),
            Axis::Cols => values.at(row, k),
        };
        if i == 0 {
            sample(1) - sample(0)
        } else if i == n - 1 {
            sample(n - 1) - sample(n - 2)
        } else {
            (sample(i + 1) - sample(i - 1)) / 2.0
        }
    })
}

/// Approximate surface area (km²) of every cell of a lat/lon grid.
///
/// `|R² · cos(lat) · Δlon · Δlat|` with angles in radians, Δlat taken down
/// the rows and Δlon across the columns. Cells whose area is not finite
/// (missing geolocation nearby) get zero area.
pub fn cell_areas(lats_deg: &Grid2D<f64>, lons_deg: &Grid2D<f64>) -> Grid2D<f64> {
    let lat_rad = lats_deg.map(f64::to_radians);
    let lon_rad = lons_deg.map(f64::to_radians);

    let dlat = gradient(&lat_rad, Axis::Rows);
    let dlon = gradient(&lon_rad, Axis::Cols);

    let (height, width) = lat_rad.shape();
    Grid2D::from_fn(height, width, |row, col| {
        let dy = EARTH_RADIUS_KM * dlat.at(row, col);
        let dx = EARTH_RADIUS_KM * lat_rad.at(row, col).cos() * dlon.at(row, col);
        let area = (dx * dy).abs();
        if area.is_finite() {
            area
        } else {
            0.0
        }
    })
}
