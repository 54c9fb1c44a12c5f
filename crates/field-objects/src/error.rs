//! Error types for grid cropping, object extraction and skill scoring.

use thiserror::Error;

/// Errors that can occur while building grids or analysing fields.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldObjectsError {
    /// No grid cell falls inside the requested bounding box.
    #[error("no grid cell within lat [{lat_min}, {lat_max}], lon [{lon_min}, {lon_max}]")]
    CropOutOfDomain {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    /// Two arrays that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Connectivity outside {4, 8}.
    #[error("connectivity must be 4 or 8, got {0}")]
    InvalidConnectivity(u8),

    /// FSS neighbourhood size that is zero or even.
    #[error("FSS window must be an odd positive integer, got {0}")]
    InvalidWindow(usize),

    /// Malformed input array.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl FieldObjectsError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Create an InvalidData error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Whether a caller can recover by skipping the current time step.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::CropOutOfDomain { .. })
    }
}

/// Result type for field analysis operations.
pub type Result<T> = std::result::Result<T, FieldObjectsError>;
