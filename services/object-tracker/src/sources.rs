//! Field sources: where each product's data for a time step comes from.

use chrono::{Datelike, NaiveDateTime, Timelike};
use field_objects::{FieldObjectsError, Grid2D};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from loading a field.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No data exists for this time step; the step is skipped.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} holds {actual} bytes, expected {expected}", path.display())]
    InvalidSize {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("NetCDF error in {}: {source}", path.display())]
    Netcdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("{}: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    #[error(transparent)]
    Grid(#[from] FieldObjectsError),
}

impl SourceError {
    /// Whether the caller should skip the time step rather than fail.
    pub fn is_missing(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// A field with the coordinates of its cells.
#[derive(Debug, Clone)]
pub struct SourceField {
    pub data: Grid2D<f32>,
    pub lats: Arc<Grid2D<f64>>,
    pub lons: Arc<Grid2D<f64>>,
}

/// Anything that can produce a product's field for a time step.
pub trait FieldSource: Send + Sync {
    fn load(&self, time: NaiveDateTime) -> Result<SourceField, SourceError>;
}

/// How a product is stored, selected by `kind` in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Raw(RawSourceConfig),
    Netcdf(NetcdfSourceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Raw(RawSourceConfig::default())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SourceConfig::Raw(c) => c.validate(),
            SourceConfig::Netcdf(c) => c.validate(),
        }
    }

    /// Open the source, reading its static geolocation.
    pub fn open(&self) -> Result<Box<dyn FieldSource>, SourceError> {
        Ok(match self {
            SourceConfig::Raw(c) => Box::new(RawFieldSource::new(c.clone())?),
            SourceConfig::Netcdf(c) => Box::new(NetcdfFieldSource::new(c.clone())?),
        })
    }
}

/// Layout of a raw raster product on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSourceConfig {
    /// Field path with `{year} {month} {day} {hour} {minute} {date} {time}`
    /// placeholders
    pub field_template: String,

    /// Latitude raster (little-endian f64)
    pub lats_path: PathBuf,

    /// Longitude raster (little-endian f64)
    pub lons_path: PathBuf,

    /// Rows in every raster
    pub height: usize,

    /// Columns in every raster
    pub width: usize,

    /// Field value meaning "no data"
    pub missing_value: Option<f32>,
}

impl RawSourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.field_template.is_empty() {
            return Err("field_template cannot be empty".to_string());
        }
        if self.lats_path.as_os_str().is_empty() || self.lons_path.as_os_str().is_empty() {
            return Err("lats_path and lons_path are required".to_string());
        }
        if self.height == 0 || self.width == 0 {
            return Err(format!(
                "raster dimensions must be positive, got {}x{}",
                self.height, self.width
            ));
        }
        Ok(())
    }
}

/// Expand the time placeholders of a path template.
pub fn expand_template(template: &str, time: NaiveDateTime) -> PathBuf {
    let year = format!("{:04}", time.year());
    let month = format!("{:02}", time.month());
    let day = format!("{:02}", time.day());
    let hour = format!("{:02}", time.hour());
    let minute = format!("{:02}", time.minute());

    let path = template
        .replace("{date}", &format!("{year}{month}{day}"))
        .replace("{time}", &format!("{hour}{minute}"))
        .replace("{year}", &year)
        .replace("{month}", &month)
        .replace("{day}", &day)
        .replace("{hour}", &hour)
        .replace("{minute}", &minute);
    PathBuf::from(path)
}

/// Reads `height × width` little-endian f32 fields named by a time template.
///
/// Geolocation is static and read once at construction.
#[derive(Debug, Clone)]
pub struct RawFieldSource {
    config: RawSourceConfig,
    lats: Arc<Grid2D<f64>>,
    lons: Arc<Grid2D<f64>>,
}

impl RawFieldSource {
    pub fn new(config: RawSourceConfig) -> Result<Self, SourceError> {
        let (height, width) = (config.height, config.width);
        let lats = read_raster(&config.lats_path, height, width, 8, |b| {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })?;
        let lons = read_raster(&config.lons_path, height, width, 8, |b| {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })?;
        debug!(
            lats = %config.lats_path.display(),
            lons = %config.lons_path.display(),
            height,
            width,
            "Loaded geolocation"
        );

        Ok(Self {
            config,
            lats: Arc::new(lats),
            lons: Arc::new(lons),
        })
    }

    pub fn path_for(&self, time: NaiveDateTime) -> PathBuf {
        expand_template(&self.config.field_template, time)
    }
}

impl FieldSource for RawFieldSource {
    #[instrument(skip(self), fields(template = %self.config.field_template))]
    fn load(&self, time: NaiveDateTime) -> Result<SourceField, SourceError> {
        let path = self.path_for(time);
        let data = read_raster(&path, self.config.height, self.config.width, 4, |b| {
            f32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })?;

        let data = match self.config.missing_value {
            Some(missing) => data.map(|v| if v == missing { f32::NAN } else { v }),
            None => data,
        };

        Ok(SourceField {
            data,
            lats: Arc::clone(&self.lats),
            lons: Arc::clone(&self.lons),
        })
    }
}

/// Layout of a NetCDF product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetcdfSourceConfig {
    /// Field file path, same placeholders as the raw template
    pub field_template: String,

    /// Variable holding the field, `(y, x)` or `(time, y, x)`
    pub field_variable: String,

    /// File holding the geolocation
    pub geo_path: PathBuf,

    /// Latitude variable, 2-D or a 1-D axis
    pub lat_variable: String,

    /// Longitude variable, 2-D or a 1-D axis
    pub lon_variable: String,

    /// Field value meaning "no data", on top of the variable's `_FillValue`
    pub missing_value: Option<f32>,
}

impl NetcdfSourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.field_template.is_empty() {
            return Err("field_template cannot be empty".to_string());
        }
        if self.field_variable.is_empty() {
            return Err("field_variable cannot be empty".to_string());
        }
        if self.geo_path.as_os_str().is_empty() {
            return Err("geo_path is required".to_string());
        }
        if self.lat_variable.is_empty() || self.lon_variable.is_empty() {
            return Err("lat_variable and lon_variable are required".to_string());
        }
        Ok(())
    }
}

/// Reads one variable per time step from NetCDF files named by a time
/// template.
///
/// Geolocation comes from a separate file, read once at construction. A
/// 3-D field variable contributes its first time slice. Values equal to the
/// variable's `_FillValue` or to `missing_value` become NaN.
#[derive(Debug, Clone)]
pub struct NetcdfFieldSource {
    config: NetcdfSourceConfig,
    lats: Arc<Grid2D<f64>>,
    lons: Arc<Grid2D<f64>>,
}

impl NetcdfFieldSource {
    pub fn new(config: NetcdfSourceConfig) -> Result<Self, SourceError> {
        let path = config.geo_path.as_path();
        let file = open_netcdf(path)?;
        let lat = read_f64_variable(&file, path, &config.lat_variable)?;
        let lon = read_f64_variable(&file, path, &config.lon_variable)?;

        let (lats, lons) = match (lat.shape.as_slice(), lon.shape.as_slice()) {
            ([h, w], [h2, w2]) if (h, w) == (h2, w2) => (
                Grid2D::new(lat.values, *h, *w)?,
                Grid2D::new(lon.values, *h, *w)?,
            ),
            ([h], [w]) => {
                let (h, w) = (*h, *w);
                let lats = (0..h * w).map(|i| lat.values[i / w]).collect();
                let lons = (0..h * w).map(|i| lon.values[i % w]).collect();
                (Grid2D::new(lats, h, w)?, Grid2D::new(lons, h, w)?)
            }
            (a, b) => {
                return Err(SourceError::InvalidFormat {
                    path: path.to_path_buf(),
                    message: format!(
                        "{} {:?} and {} {:?} are not matching 2-D grids or 1-D axes",
                        config.lat_variable, a, config.lon_variable, b
                    ),
                })
            }
        };
        debug!(
            geo_path = %path.display(),
            height = lats.height(),
            width = lats.width(),
            "Loaded geolocation"
        );

        Ok(Self {
            config,
            lats: Arc::new(lats),
            lons: Arc::new(lons),
        })
    }

    pub fn path_for(&self, time: NaiveDateTime) -> PathBuf {
        expand_template(&self.config.field_template, time)
    }
}

impl FieldSource for NetcdfFieldSource {
    #[instrument(skip(self), fields(template = %self.config.field_template))]
    fn load(&self, time: NaiveDateTime) -> Result<SourceField, SourceError> {
        let path = self.path_for(time);
        let file = open_netcdf(&path)?;
        let name = &self.config.field_variable;
        let var = file.variable(name).ok_or_else(|| SourceError::InvalidFormat {
            path: path.clone(),
            message: format!("variable {name} not found"),
        })?;

        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let (height, width) = match dims.as_slice() {
            [h, w] | [_, h, w] => (*h, *w),
            other => {
                return Err(SourceError::InvalidFormat {
                    path,
                    message: format!("variable {name} has shape {other:?}, expected 2-D or 3-D"),
                })
            }
        };
        if (height, width) != self.lats.shape() {
            return Err(SourceError::InvalidFormat {
                path,
                message: format!(
                    "variable {name} is {height}x{width}, geolocation is {:?}",
                    self.lats.shape()
                ),
            });
        }

        let mut values: Vec<f32> = var.get_values(..).map_err(|e| SourceError::Netcdf {
            path: path.clone(),
            source: e,
        })?;
        values.truncate(height * width);

        let fill = fill_value_attr(&var).and_then(|v| f32::try_from(v).ok());
        let missing = self.config.missing_value;
        let data = Grid2D::new(values, height, width)?.map(|v| {
            if Some(v) == fill || Some(v) == missing {
                f32::NAN
            } else {
                v
            }
        });

        Ok(SourceField {
            data,
            lats: Arc::clone(&self.lats),
            lons: Arc::clone(&self.lons),
        })
    }
}

fn open_netcdf(path: &Path) -> Result<netcdf::File, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    netcdf::open(path).map_err(|e| SourceError::Netcdf {
        path: path.to_path_buf(),
        source: e,
    })
}

/// The variable's `_FillValue`, looked up by listing attributes first so a
/// missing one does not make HDF5 print diagnostics.
fn fill_value_attr(var: &netcdf::Variable) -> Option<netcdf::AttributeValue> {
    if !var.attributes().any(|attr| attr.name() == "_FillValue") {
        return None;
    }
    var.attribute_value("_FillValue")?.ok()
}

struct GeoVariable {
    values: Vec<f64>,
    shape: Vec<usize>,
}

/// Read a whole variable as f64, mapping its `_FillValue` to NaN.
fn read_f64_variable(
    file: &netcdf::File,
    path: &Path,
    name: &str,
) -> Result<GeoVariable, SourceError> {
    let var = file.variable(name).ok_or_else(|| SourceError::InvalidFormat {
        path: path.to_path_buf(),
        message: format!("variable {name} not found"),
    })?;
    let shape = var.dimensions().iter().map(|d| d.len()).collect();
    let fill = fill_value_attr(&var).and_then(|v| f64::try_from(v).ok());

    let values: Vec<f64> = var.get_values(..).map_err(|e| SourceError::Netcdf {
        path: path.to_path_buf(),
        source: e,
    })?;
    let values = values
        .into_iter()
        .map(|v| if Some(v) == fill { f64::NAN } else { v })
        .collect();
    Ok(GeoVariable { values, shape })
}

/// Read a raster of fixed-size little-endian values.
fn read_raster<T: Copy>(
    path: &Path,
    height: usize,
    width: usize,
    value_size: usize,
    decode: impl Fn(&[u8]) -> T,
) -> Result<Grid2D<T>, SourceError> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SourceError::NotFound(path.to_path_buf())
        } else {
            SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let expected = height * width * value_size;
    if bytes.len() != expected {
        return Err(SourceError::InvalidSize {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }

    let values = bytes.chunks_exact(value_size).map(decode).collect();
    Ok(Grid2D::new(values, height, width)?)
}
