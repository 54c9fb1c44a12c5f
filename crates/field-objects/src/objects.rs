//! Object extraction from thresholded fields.
//!
//! An object is a connected set of cells whose value reaches a threshold.
//! Each object is summarised by an [`ObjectRecord`] with area-weighted
//! position and shape statistics taken from the [`GeodesicGrid`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ObjectExtractionConfig;
use crate::error::{FieldObjectsError, Result};
use crate::geogrid::GeodesicGrid;
use crate::labeling::{Connectivity, LabelMap};
use crate::shape::ShapeDescriptors;
use crate::types::Grid2D;

/// Summary of one connected region.
///
/// Field order matches the flat table layout written by persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// 1-based component label, in raster order of first cell.
    pub label: u32,
    /// Area-weighted mean latitude.
    pub lat_centroid: f64,
    /// Area-weighted mean longitude.
    pub lon_centroid: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    /// Cumulative cell area in km².
    pub size: f64,
    /// Number of cells.
    pub n_pix: usize,
    pub mean_value: f64,
    pub max_value: f64,
    pub elongation: f64,
    pub eccentricity: f64,
}

/// Objects of one field, ordered by descending area.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTable {
    name: String,
    records: Vec<ObjectRecord>,
}

impl ObjectTable {
    /// Fixed column names; `{}` marks where the value name goes.
    const COLUMNS: [&'static str; 13] = [
        "label",
        "lat_centroid",
        "lon_centroid",
        "lat_min",
        "lat_max",
        "lon_min",
        "lon_max",
        "size",
        "n_pix",
        "mean_{}",
        "max_{}",
        "elongation",
        "eccentricity",
    ];

    /// An empty table for `name`.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Value name this table was extracted with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column headers, with `mean_<name>` / `max_<name>` for the values.
    pub fn column_names(&self) -> Vec<String> {
        Self::COLUMNS
            .iter()
            .map(|c| c.replace("{}", &self.name))
            .collect()
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ObjectRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObjectRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of object areas in km².
    pub fn total_area_km2(&self) -> f64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

impl<'a> IntoIterator for &'a ObjectTable {
    type Item = &'a ObjectRecord;
    type IntoIter = std::slice::Iter<'a, ObjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Extract objects from `field`, which must already be cropped to `grid`.
///
/// Returns an empty table when no cell reaches the threshold.
///
/// # Errors
///
/// * [`FieldObjectsError::InvalidConnectivity`] if `config.connectivity` is not 4 or 8.
/// * [`FieldObjectsError::ShapeMismatch`] if `field` and `grid` differ in shape.
pub fn extract_objects(
    field: &Grid2D<f32>,
    grid: &GeodesicGrid,
    config: &ObjectExtractionConfig,
) -> Result<ObjectTable> {
    let connectivity = Connectivity::try_from(config.connectivity)?;

    if field.shape() != grid.shape() {
        return Err(FieldObjectsError::shape_mismatch(grid.shape(), field.shape()));
    }

    let threshold = config.threshold;
    let mask = field.map(|v| f64::from(v) >= threshold);
    if !mask.as_slice().iter().any(|&m| m) {
        return Ok(ObjectTable::empty(config.name.clone()));
    }

    let labels = LabelMap::from_mask(&mask, connectivity);
    let components = labels.components();

    let mut records: Vec<ObjectRecord> = components
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| describe(i as u32 + 1, cells, field, grid, config))
        .collect();

    // Stable: equal areas keep label order.
    records.sort_by(|a, b| b.size.total_cmp(&a.size));

    debug!(
        name = %config.name,
        threshold,
        components = components.len(),
        kept = records.len(),
        "Extracted objects"
    );

    Ok(ObjectTable {
        name: config.name.clone(),
        records,
    })
}

/// Build the record for one component, or `None` if it is filtered out.
fn describe(
    label: u32,
    cells: &[usize],
    field: &Grid2D<f32>,
    grid: &GeodesicGrid,
    config: &ObjectExtractionConfig,
) -> Option<ObjectRecord> {
    let n_pix = cells.len();
    if n_pix < config.min_pixels {
        return None;
    }

    let area = grid.area().as_slice();
    let weights: Vec<f64> = cells.iter().map(|&i| area[i]).collect();
    let size: f64 = weights.iter().sum();
    if size < config.min_area_km2 {
        return None;
    }

    let lats = grid.lats().as_slice();
    let lons = grid.lons().as_slice();
    let points: Vec<(f64, f64)> = cells.iter().map(|&i| (lats[i], lons[i])).collect();

    let mut lat_centroid = 0.0;
    let mut lon_centroid = 0.0;
    for (&(lat, lon), &w) in points.iter().zip(&weights) {
        if w > 0.0 {
            lat_centroid += w * lat;
            lon_centroid += w * lon;
        }
    }
    lat_centroid /= size;
    lon_centroid /= size;

    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lon_min, mut lon_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(lat, lon) in &points {
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
    }

    let values = field.as_slice();
    let (mut sum, mut count, mut max_value) = (0.0, 0usize, f64::NEG_INFINITY);
    for &i in cells {
        let v = f64::from(values[i]);
        if v.is_nan() {
            continue;
        }
        sum += v;
        count += 1;
        max_value = max_value.max(v);
    }
    let mean_value = if count > 0 { sum / count as f64 } else { f64::NAN };
    if count == 0 {
        max_value = f64::NAN;
    }

    // Cells without geolocation have zero weight and NaN position.
    let (shape_points, shape_weights): (Vec<(f64, f64)>, Vec<f64>) = points
        .iter()
        .zip(&weights)
        .filter(|(p, _)| p.0.is_finite() && p.1.is_finite())
        .map(|(&p, &w)| (p, w))
        .unzip();
    let shape = if n_pix < 2 {
        ShapeDescriptors::DEGENERATE
    } else {
        ShapeDescriptors::from_weighted_points(&shape_points, &shape_weights)
    };

    Some(ObjectRecord {
        label,
        lat_centroid,
        lon_centroid,
        lat_min,
        lat_max,
        lon_min,
        lon_max,
        size,
        n_pix,
        mean_value,
        max_value,
        elongation: shape.elongation,
        eccentricity: shape.eccentricity,
    })
}
