//! Object analysis for gridded geophysical fields.
//!
//! This crate finds contiguous high-value regions ("objects") in 2-D fields
//! on irregular latitude/longitude grids and compares two fields spatially:
//!
//! - **Geodesic grid**: crop lat/lon arrays to a region, compute each cell's
//!   area in km², and look up the nearest cell to a point
//! - **Object extraction**: threshold, label connected components, and
//!   describe each component with area-weighted statistics
//! - **Fractions skill score**: neighbourhood verification of one field
//!   against another
//!
//! # Architecture
//!
//! ```text
//! lats, lons ──► GeodesicGrid::new(bbox) ──► crop window, cell area, k-d tree
//!                      │
//! field ──────► grid.crop(field)
//!                      │
//!                      ▼
//!          extract_objects(field, grid, config) ──► ObjectTable
//!
//! pred, obs ──► fss(pred, obs, window) ──► score
//! ```
//!
//! Everything here is pure computation; loading data and writing tables is
//! left to the caller.
//!
//! # Example
//!
//! ```
//! use field_objects::{extract_objects, BoundingBox, GeodesicGrid, Grid2D, ObjectExtractionConfig};
//!
//! let lats = Grid2D::from_fn(5, 5, |r, _| 10.0 - r as f64 * 0.1);
//! let lons = Grid2D::from_fn(5, 5, |_, c| -10.0 + c as f64 * 0.1);
//! let bbox = BoundingBox::new(9.0, 11.0, -11.0, -9.0);
//! let grid = GeodesicGrid::new(&lats, &lons, bbox, GeodesicGrid::DEFAULT_FILL_VALUE).unwrap();
//!
//! let field = Grid2D::from_fn(5, 5, |r, c| if (1..=2).contains(&r) && (1..=2).contains(&c) { 10.0f32 } else { 0.0 });
//! let field = grid.crop(&field).unwrap();
//!
//! let config = ObjectExtractionConfig::new(5.0, "core").with_min_pixels(1);
//! let objects = extract_objects(&field, &grid, &config).unwrap();
//! assert_eq!(objects.len(), 1);
//! assert_eq!(objects.records()[0].n_pix, 4);
//! ```

pub mod config;
pub mod error;
pub mod fss;
pub mod geogrid;
pub mod geometry;
pub mod labeling;
pub mod objects;
pub mod shape;
pub mod spatial;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ObjectExtractionConfig;
pub use error::{FieldObjectsError, Result};
pub use fss::{exceedance_fraction, fss, fss_multi};
pub use geogrid::GeodesicGrid;
pub use geometry::EARTH_RADIUS_KM;
pub use labeling::{Connectivity, LabelMap};
pub use objects::{extract_objects, ObjectRecord, ObjectTable};
pub use shape::ShapeDescriptors;
pub use types::{BoundingBox, CropWindow, Grid2D};
