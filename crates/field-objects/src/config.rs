//! Configuration for object extraction.

use serde::{Deserialize, Serialize};

use crate::labeling::Connectivity;

/// Parameters for turning a thresholded field into objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectExtractionConfig {
    /// Cells with `value >= threshold` belong to objects.
    pub threshold: f64,

    /// Neighbourhood rule, 4 or 8. Validated when extraction runs.
    pub connectivity: u8,

    /// Value name used for the `mean_<name>` / `max_<name>` columns.
    pub name: String,

    /// Objects with fewer cells are dropped.
    pub min_pixels: usize,

    /// Objects smaller than this area (km²) are dropped.
    pub min_area_km2: f64,
}

impl Default for ObjectExtractionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            connectivity: Connectivity::Eight.as_u8(),
            name: "field".to_string(),
            min_pixels: 0,
            min_area_km2: 0.0,
        }
    }
}

impl ObjectExtractionConfig {
    /// Config with the given threshold and name, defaults elsewhere.
    pub fn new(threshold: f64, name: impl Into<String>) -> Self {
        Self {
            threshold,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_connectivity(mut self, connectivity: u8) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_min_pixels(mut self, min_pixels: usize) -> Self {
        self.min_pixels = min_pixels;
        self
    }

    pub fn with_min_area_km2(mut self, min_area_km2: f64) -> Self {
        self.min_area_km2 = min_area_km2;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() {
            return Err("threshold must be finite".to_string());
        }

        if Connectivity::try_from(self.connectivity).is_err() {
            return Err(format!(
                "connectivity must be 4 or 8, got {}",
                self.connectivity
            ));
        }

        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }

        if self.min_area_km2 < 0.0 {
            return Err("min_area_km2 must be >= 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObjectExtractionConfig::default();
        assert_eq!(config.connectivity, 8);
        assert_eq!(config.name, "field");
        assert_eq!(config.min_pixels, 0);
        assert_eq!(config.min_area_km2, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObjectExtractionConfig::new(5.0, "core");
        assert!(config.validate().is_ok());

        config.connectivity = 6;
        assert!(config.validate().is_err());

        config = ObjectExtractionConfig::new(f64::NAN, "core");
        assert!(config.validate().is_err());

        config = ObjectExtractionConfig::new(1.0, "");
        assert!(config.validate().is_err());

        config = ObjectExtractionConfig::new(1.0, "roa").with_min_area_km2(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = ObjectExtractionConfig::new(0.5, "roa")
            .with_connectivity(4)
            .with_min_pixels(3)
            .with_min_area_km2(25.0);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.connectivity, 4);
        assert_eq!(config.min_pixels, 3);
        assert_eq!(config.min_area_km2, 25.0);
    }
}
