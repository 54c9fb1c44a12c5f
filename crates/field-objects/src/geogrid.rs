//! Cropped geographic grid with per-cell area and nearest-cell lookup.
//!
//! A [`GeodesicGrid`] is built from full-domain latitude/longitude arrays and
//! a target [`BoundingBox`]. It keeps the smallest index-space rectangle that
//! contains every in-box cell, the area of each cell in km², and a k-d tree
//! over the cell centres.
//!
//! # Crop semantics
//!
//! Rows and columns are selected independently: a row is kept if any of its
//! cells is in the box, and likewise for columns. On a curvilinear grid the
//! resulting rectangle can hold cells outside the box near its corners. They
//! are kept on purpose; use [`GeodesicGrid::contains`] to mask them.
//!
//! ```ignore
//! use field_objects::{BoundingBox, GeodesicGrid};
//!
//! let bbox = BoundingBox::new(5.0, 20.0, -20.0, -4.0);
//! let grid = GeodesicGrid::new(&lats, &lons, bbox, GeodesicGrid::DEFAULT_FILL_VALUE)?;
//! let cropped = grid.crop(&field)?;
//! let (row, col) = grid.query(12.0, -8.5);
//! ```

use tracing::debug;

use crate::error::{FieldObjectsError, Result};
use crate::geometry::cell_areas;
use crate::spatial::KdTree;
use crate::types::{BoundingBox, CropWindow, Grid2D};

/// A lat/lon grid cropped to a region, with cell areas and a spatial index.
#[derive(Debug, Clone)]
pub struct GeodesicGrid {
    lats: Grid2D<f64>,
    lons: Grid2D<f64>,
    area: Grid2D<f64>,
    window: CropWindow,
    original_shape: (usize, usize),
    bbox: BoundingBox,
    fill_value: f64,
    index: KdTree,
}

impl GeodesicGrid {
    /// Geolocation fill value used by the satellite products this was built for.
    pub const DEFAULT_FILL_VALUE: f64 = -999.999;

    /// Crop `lats`/`lons` to `bbox` and compute cell areas.
    ///
    /// Cells equal to `fill_value` in either array are treated as having no
    /// position: they never count as in-box, and inside the crop they carry
    /// NaN coordinates and zero area.
    ///
    /// # Errors
    ///
    /// * [`FieldObjectsError::ShapeMismatch`] if `lats` and `lons` differ in shape.
    /// * [`FieldObjectsError::CropOutOfDomain`] if no cell lies in the box.
    pub fn new(
        lats: &Grid2D<f64>,
        lons: &Grid2D<f64>,
        bbox: BoundingBox,
        fill_value: f64,
    ) -> Result<Self> {
        if lats.shape() != lons.shape() {
            return Err(FieldObjectsError::shape_mismatch(lats.shape(), lons.shape()));
        }

        let (height, width) = lats.shape();
        let position = |row: usize, col: usize| -> Option<(f64, f64)> {
            let lat = lats.at(row, col);
            let lon = lons.at(row, col);
            if lat == fill_value || lon == fill_value || lat.is_nan() || lon.is_nan() {
                None
            } else {
                Some((lat, lon))
            }
        };

        let mut row_hit = vec![false; height];
        let mut col_hit = vec![false; width];
        for row in 0..height {
            for col in 0..width {
                if let Some((lat, lon)) = position(row, col) {
                    if bbox.contains(lat, lon) {
                        row_hit[row] = true;
                        col_hit[col] = true;
                    }
                }
            }
        }

        let out_of_domain = || FieldObjectsError::CropOutOfDomain {
            lat_min: bbox.lat_min,
            lat_max: bbox.lat_max,
            lon_min: bbox.lon_min,
            lon_max: bbox.lon_max,
        };
        let y0 = row_hit.iter().position(|&h| h).ok_or_else(out_of_domain)?;
        let y1 = row_hit.iter().rposition(|&h| h).ok_or_else(out_of_domain)?;
        let x0 = col_hit.iter().position(|&h| h).ok_or_else(out_of_domain)?;
        let x1 = col_hit.iter().rposition(|&h| h).ok_or_else(out_of_domain)?;
        let window = CropWindow { y0, y1, x0, x1 };

        let (crop_h, crop_w) = window.shape();
        let positions = Grid2D::from_fn(crop_h, crop_w, |r, c| position(y0 + r, x0 + c));
        let crop_lats = positions.map(|p| p.map_or(f64::NAN, |(lat, _)| lat));
        let crop_lons = positions.map(|p| p.map_or(f64::NAN, |(_, lon)| lon));

        let area = cell_areas(&crop_lats, &crop_lons);

        let index = KdTree::build(
            crop_lats
                .as_slice()
                .iter()
                .zip(crop_lons.as_slice())
                .enumerate()
                .map(|(i, (&lat, &lon))| (i, [lat, lon])),
        )
        // At least one in-box cell has a valid position.
        .ok_or_else(out_of_domain)?;

        debug!(
            y0,
            y1,
            x0,
            x1,
            cells = crop_h * crop_w,
            indexed = index.len(),
            "Built geodesic grid"
        );

        Ok(Self {
            lats: crop_lats,
            lons: crop_lons,
            area,
            window,
            original_shape: (height, width),
            bbox,
            fill_value,
            index,
        })
    }

    /// Cut `field` to this grid's crop window.
    ///
    /// # Errors
    ///
    /// [`FieldObjectsError::ShapeMismatch`] unless `field` has the shape of
    /// the original, uncropped coordinate arrays.
    pub fn crop<T: Copy>(&self, field: &Grid2D<T>) -> Result<Grid2D<T>> {
        if field.shape() != self.original_shape {
            return Err(FieldObjectsError::shape_mismatch(
                self.original_shape,
                field.shape(),
            ));
        }
        Ok(field.window(&self.window))
    }

    /// Index `(row, col)` within the crop of the cell centre nearest to
    /// `(lat, lon)` in degree space.
    pub fn query(&self, lat: f64, lon: f64) -> (usize, usize) {
        let (id, _) = self.index.nearest([lat, lon]);
        (id / self.lats.width(), id % self.lats.width())
    }

    /// [`query`](Self::query) over parallel coordinate slices.
    pub fn query_many(&self, lats: &[f64], lons: &[f64]) -> Result<Vec<(usize, usize)>> {
        if lats.len() != lons.len() {
            return Err(FieldObjectsError::shape_mismatch(
                (lats.len(), 1),
                (lons.len(), 1),
            ));
        }
        Ok(lats
            .iter()
            .zip(lons)
            .map(|(&lat, &lon)| self.query(lat, lon))
            .collect())
    }

    /// Precise in-box test against the box the grid was cropped to.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bbox.contains(lat, lon)
    }

    /// Cropped latitudes (NaN where geolocation is missing).
    pub fn lats(&self) -> &Grid2D<f64> {
        &self.lats
    }

    /// Cropped longitudes (NaN where geolocation is missing).
    pub fn lons(&self) -> &Grid2D<f64> {
        &self.lons
    }

    /// Per-cell area in km².
    pub fn area(&self) -> &Grid2D<f64> {
        &self.area
    }

    pub fn window(&self) -> CropWindow {
        self.window
    }

    /// Shape of the cropped grid.
    pub fn shape(&self) -> (usize, usize) {
        self.lats.shape()
    }

    /// Shape of the coordinate arrays the grid was built from.
    pub fn original_shape(&self) -> (usize, usize) {
        self.original_shape
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Sum of all cell areas in km².
    pub fn total_area_km2(&self) -> f64 {
        self.area.as_slice().iter().sum()
    }
}
