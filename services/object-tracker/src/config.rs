//! Tracker configuration.
//!
//! Loaded from a YAML file (or defaults), then overridden from environment
//! variables, then validated before any work starts.

use anyhow::{Context, Result};
use field_objects::{BoundingBox, GeodesicGrid};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::sources::SourceConfig;

/// Top-level tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Region every field is cropped to
    pub region: BoundingBox,

    /// Geolocation fill value in the lat/lon rasters
    pub fill_value: f64,

    /// Minutes between consecutive time steps
    pub step_minutes: i64,

    /// Root of the per-product CSV tree and the FSS summaries
    pub output_dir: PathBuf,

    /// Connectivity used for labeling (4 or 8)
    pub connectivity: u8,

    /// Objects smaller than this (km²) are dropped
    pub min_area_km2: f64,

    /// Neighbourhood sizes for FSS between the two products
    pub fss_windows: Vec<usize>,

    /// Convective core product
    pub core: ProductConfig,

    /// Rainfall-probability product
    pub roa: ProductConfig,
}

/// One input product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Value name used in the `mean_<name>` / `max_<name>` columns
    pub name: String,

    /// Where the fields and geolocation live
    pub source: SourceConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            region: BoundingBox::new(5.0, 20.0, -20.0, -4.0),
            fill_value: GeodesicGrid::DEFAULT_FILL_VALUE,
            step_minutes: 15,
            output_dir: PathBuf::from("output"),
            connectivity: 8,
            min_area_km2: 0.0,
            fss_windows: vec![1, 5, 11, 21],
            core: ProductConfig {
                name: "core".to_string(),
                source: SourceConfig::default(),
            },
            roa: ProductConfig {
                name: "roa".to_string(),
                source: SourceConfig::default(),
            },
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if given, else defaults; then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from `TRACKER_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = get("TRACKER_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(v) = get("TRACKER_STEP_MINUTES") {
            self.step_minutes = v
                .parse()
                .with_context(|| format!("TRACKER_STEP_MINUTES is not an integer: {v}"))?;
        }
        if let Some(v) = get("TRACKER_CONNECTIVITY") {
            self.connectivity = v
                .parse()
                .with_context(|| format!("TRACKER_CONNECTIVITY is not an integer: {v}"))?;
        }
        if let Some(v) = get("TRACKER_MIN_AREA_KM2") {
            self.min_area_km2 = v
                .parse()
                .with_context(|| format!("TRACKER_MIN_AREA_KM2 is not a number: {v}"))?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.region.is_valid() {
            return Err(format!(
                "region must be finite with lat_min <= lat_max and lon_min <= lon_max, got {:?}",
                self.region
            ));
        }
        if self.step_minutes <= 0 {
            return Err(format!("step_minutes must be positive, got {}", self.step_minutes));
        }
        if self.connectivity != 4 && self.connectivity != 8 {
            return Err(format!("connectivity must be 4 or 8, got {}", self.connectivity));
        }
        if self.min_area_km2.is_nan() || self.min_area_km2 < 0.0 {
            return Err(format!("min_area_km2 must be >= 0, got {}", self.min_area_km2));
        }
        if let Some(w) = self.fss_windows.iter().find(|&&w| w == 0 || w % 2 == 0) {
            return Err(format!("fss_windows must be odd and positive, got {w}"));
        }
        for product in [&self.core, &self.roa] {
            if product.name.is_empty() {
                return Err("product name cannot be empty".to_string());
            }
            product
                .source
                .validate()
                .map_err(|e| format!("{}: {}", product.name, e))?;
        }
        Ok(())
    }
}
