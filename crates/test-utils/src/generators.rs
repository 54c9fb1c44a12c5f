//! Test data generators for synthetic grids and fields.
//!
//! These generators create predictable, verifiable patterns: regular and
//! sheared lat/lon grids, and fields holding discs, rectangles or lines of a
//! known value on a zero background.

use field_objects::Grid2D;

/// Creates a regular lat/lon grid.
///
/// Row 0 sits at `lat_top` and latitude decreases by `step` per row
/// (north-up, like most imagers); longitude increases by `step` per column
/// from `lon_left`.
///
/// # Returns
///
/// `(lats, lons)`, both `height × width`.
///
/// # Example
///
/// ```
/// use test_utils::regular_latlon_grid;
///
/// let (lats, lons) = regular_latlon_grid(3, 4, 10.0, -5.0, 0.5);
/// assert_eq!(lats.shape(), (3, 4));
/// assert_eq!(lats.at(2, 0), 9.0);
/// assert_eq!(lons.at(0, 3), -3.5);
/// ```
pub fn regular_latlon_grid(
    height: usize,
    width: usize,
    lat_top: f64,
    lon_left: f64,
    step: f64,
) -> (Grid2D<f64>, Grid2D<f64>) {
    let lats = Grid2D::from_fn(height, width, |row, _| lat_top - row as f64 * step);
    let lons = Grid2D::from_fn(height, width, |_, col| lon_left + col as f64 * step);
    (lats, lons)
}

/// Creates a curvilinear grid whose longitude drifts by `shear` per row.
///
/// Row/column cropping of such a grid picks up cells outside the box near
/// the corners.
pub fn sheared_latlon_grid(
    height: usize,
    width: usize,
    lat_top: f64,
    lon_left: f64,
    step: f64,
    shear: f64,
) -> (Grid2D<f64>, Grid2D<f64>) {
    let lats = Grid2D::from_fn(height, width, |row, _| lat_top - row as f64 * step);
    let lons = Grid2D::from_fn(height, width, |row, col| {
        lon_left + col as f64 * step + row as f64 * shear
    });
    (lats, lons)
}

/// Replaces the geolocation of the given cells with `fill_value`.
pub fn with_fill_cells(grid: &Grid2D<f64>, cells: &[(usize, usize)], fill_value: f64) -> Grid2D<f64> {
    let width = grid.width();
    let mut data = grid.as_slice().to_vec();
    for &(row, col) in cells {
        data[row * width + col] = fill_value;
    }
    Grid2D::new(data, grid.height(), width).expect("same dimensions")
}

/// A zero field with an axis-aligned rectangle of `value`.
///
/// Rows `r0..r0 + rows` and columns `c0..c0 + cols` are set.
pub fn rectangle_field(
    height: usize,
    width: usize,
    (r0, c0): (usize, usize),
    (rows, cols): (usize, usize),
    value: f32,
) -> Grid2D<f32> {
    Grid2D::from_fn(height, width, |row, col| {
        if (r0..r0 + rows).contains(&row) && (c0..c0 + cols).contains(&col) {
            value
        } else {
            0.0
        }
    })
}

/// A zero field with a filled disc of `value` centred on `(row, col)`.
pub fn disc_field(
    height: usize,
    width: usize,
    center: (f64, f64),
    radius: f64,
    value: f32,
) -> Grid2D<f32> {
    Grid2D::from_fn(height, width, |row, col| {
        let dr = row as f64 - center.0;
        let dc = col as f64 - center.1;
        if dr * dr + dc * dc <= radius * radius {
            value
        } else {
            0.0
        }
    })
}

/// A zero field with a one-cell-wide horizontal line of `value`.
pub fn line_field(height: usize, width: usize, row: usize, cols: std::ops::Range<usize>, value: f32) -> Grid2D<f32> {
    Grid2D::from_fn(height, width, |r, c| {
        if r == row && cols.contains(&c) {
            value
        } else {
            0.0
        }
    })
}

/// Overlays the non-zero cells of `top` onto `base`.
pub fn overlay(base: &Grid2D<f32>, top: &Grid2D<f32>) -> Grid2D<f32> {
    let (height, width) = base.shape();
    Grid2D::from_fn(height, width, |r, c| {
        let t = top.at(r, c);
        if t != 0.0 {
            t
        } else {
            base.at(r, c)
        }
    })
}

/// Deterministic pseudo-random field in `[0, 1)` (xorshift).
///
/// Useful for property-style tests that should not depend on a RNG crate.
pub fn noise_field(height: usize, width: usize, seed: u64) -> Grid2D<f32> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    Grid2D::from_fn(height, width, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 40) as f32 / (1u64 << 24) as f32
    })
}
