//! Core array and region types.

use serde::{Deserialize, Serialize};

use crate::error::{FieldObjectsError, Result};

/// A geographic bounding box in degrees.
///
/// Both ranges are closed: a point on the edge is inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Check if a point is contained within this bounding box.
    ///
    /// NaN coordinates are never contained.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Get the height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Get the width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Whether the ranges are ordered and finite.
    pub fn is_valid(&self) -> bool {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite())
            && self.lat_min <= self.lat_max
            && self.lon_min <= self.lon_max
    }
}

/// A dense 2-D array in row-major order (row 0 first).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy> Grid2D<T> {
    /// Wrap row-major data of the given dimensions.
    pub fn new(data: Vec<T>, height: usize, width: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(FieldObjectsError::invalid_data(format!(
                "{} values cannot fill a {}x{} grid",
                data.len(),
                height,
                width
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A grid with every cell set to `value`.
    pub fn filled(height: usize, width: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Build a grid from equally long rows.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(FieldObjectsError::invalid_data("ragged rows"));
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(data, height, width)
    }

    /// (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the value at a grid coordinate.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Unchecked-by-contract indexing; panics when out of range.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Copy the inclusive sub-rectangle described by `window`.
    pub fn window(&self, window: &CropWindow) -> Self {
        let (height, width) = window.shape();
        let mut data = Vec::with_capacity(width * height);
        for row in window.y0..=window.y1 {
            let start = row * self.width + window.x0;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Apply `f` to every cell.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid2D<U> {
        Grid2D {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Get the total number of grid points.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Inclusive row/column offsets of a crop within the original grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub y0: usize,
    pub y1: usize,
    pub x0: usize,
    pub x1: usize,
}

impl CropWindow {
    /// (rows, columns) covered by the window.
    pub fn shape(&self) -> (usize, usize) {
        (self.y1 - self.y0 + 1, self.x1 - self.x0 + 1)
    }
}
