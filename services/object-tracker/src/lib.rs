//! Object tracking service.
//!
//! Runs two gridded products (convective cores and rainfall probability)
//! through object extraction over a time range, writes one CSV table per
//! product and time step, scores the products against each other with the
//! fractions skill score, and merges per-step tables into one file.

pub mod config;
pub mod merge;
pub mod persist;
pub mod pipeline;
pub mod sources;
pub mod timesteps;

pub use config::{ProductConfig, TrackerConfig};
pub use merge::{merge_tables, MergeSummary};
pub use pipeline::{Pipeline, RunParams, RunSummary, StepOutcome};
pub use sources::{
    FieldSource, NetcdfFieldSource, NetcdfSourceConfig, RawFieldSource, RawSourceConfig,
    SourceConfig, SourceError, SourceField,
};
