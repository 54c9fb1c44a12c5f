//! Batch run over a time range.
//!
//! For each time step both products are loaded, cropped to the configured
//! region and turned into object tables. A step is kept only when both
//! products reach their thresholds somewhere and both yield at least one
//! object. Kept steps are written to CSV and, when the two cropped fields
//! share a shape, scored against each other with FSS.
//!
//! Time steps are independent and run in parallel.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use field_objects::{
    exceedance_fraction, extract_objects, fss_multi, GeodesicGrid, Grid2D,
    ObjectExtractionConfig,
};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{ProductConfig, TrackerConfig};
use crate::persist::{save_fss, save_table, table_dir, FssRow};
use crate::sources::{FieldSource, SourceError};
use crate::timesteps::{format_timestamp, generate_time_steps, threshold_tag};

/// Parameters of one run, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub threshold_core: f64,
    pub threshold_roa: f64,
    pub min_pixels: usize,
}

/// What happened to one time step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Both tables written.
    Saved {
        core_objects: usize,
        roa_objects: usize,
        fss: Vec<(usize, f64)>,
    },
    /// A product had no file for this time.
    MissingData,
    /// The region lies outside a product's geolocation.
    OutOfDomain,
    /// A product never reaches its threshold in the region.
    BelowThreshold,
    /// Thresholds reached, but a product kept no objects after filtering.
    NoObjects,
}

/// Counts over a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub saved: usize,
    pub missing: usize,
    pub out_of_domain: usize,
    pub below_threshold: usize,
    pub no_objects: usize,
    pub failed: usize,
    pub fss_file: Option<PathBuf>,
}

/// Runs the core and roa products through extraction and scoring.
pub struct Pipeline {
    config: TrackerConfig,
    core: Box<dyn FieldSource>,
    roa: Box<dyn FieldSource>,
}

impl Pipeline {
    pub fn new(config: TrackerConfig, core: Box<dyn FieldSource>, roa: Box<dyn FieldSource>) -> Self {
        Self { config, core, roa }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Process every time step from `params.start` to `params.end`.
    ///
    /// Failed steps are logged and counted; the run itself only fails on
    /// invalid parameters or when the FSS summary cannot be written.
    pub fn run(&self, params: &RunParams) -> Result<RunSummary> {
        let times = generate_time_steps(params.start, params.end, self.config.step_minutes)?;
        let core_tag = threshold_tag(params.threshold_core);
        let roa_tag = threshold_tag(params.threshold_roa);

        info!(
            steps = times.len(),
            core_tag = %core_tag,
            roa_tag = %roa_tag,
            min_pixels = params.min_pixels,
            "Starting run"
        );

        let outcomes: Vec<(NaiveDateTime, Result<StepOutcome>)> = times
            .par_iter()
            .map(|&t| (t, self.process_step(t, params)))
            .collect();

        let mut summary = RunSummary {
            steps: times.len(),
            ..Default::default()
        };
        let mut fss_rows = Vec::new();
        for (t, outcome) in outcomes {
            match outcome {
                Ok(StepOutcome::Saved { fss, .. }) => {
                    summary.saved += 1;
                    fss_rows.extend(fss.into_iter().map(|(window, fss)| FssRow {
                        time: format_timestamp(t),
                        window,
                        fss,
                    }));
                }
                Ok(StepOutcome::MissingData) => summary.missing += 1,
                Ok(StepOutcome::OutOfDomain) => summary.out_of_domain += 1,
                Ok(StepOutcome::BelowThreshold) => summary.below_threshold += 1,
                Ok(StepOutcome::NoObjects) => summary.no_objects += 1,
                Err(e) => {
                    warn!(time = %t, error = %format!("{e:#}"), "Time step failed");
                    summary.failed += 1;
                }
            }
        }

        if !fss_rows.is_empty() {
            let path = save_fss(&fss_rows, &self.config.output_dir, &core_tag, &roa_tag)?;
            summary.fss_file = Some(path);
        }

        info!(
            steps = summary.steps,
            saved = summary.saved,
            missing = summary.missing,
            out_of_domain = summary.out_of_domain,
            below_threshold = summary.below_threshold,
            no_objects = summary.no_objects,
            failed = summary.failed,
            "Run complete"
        );
        Ok(summary)
    }

    /// Process one time step.
    pub fn process_step(&self, t: NaiveDateTime, params: &RunParams) -> Result<StepOutcome> {
        info!(time = %t, "Processing time step");

        let Some(core) = self.load_cropped(self.core.as_ref(), t)? else {
            return Ok(StepOutcome::MissingData);
        };
        let Some(roa) = self.load_cropped(self.roa.as_ref(), t)? else {
            return Ok(StepOutcome::MissingData);
        };
        let (Cropped::Ready(core_grid, core_field), Cropped::Ready(roa_grid, roa_field)) = (core, roa)
        else {
            debug!(time = %t, "Region outside product domain");
            return Ok(StepOutcome::OutOfDomain);
        };

        if !reaches(&core_field, params.threshold_core) || !reaches(&roa_field, params.threshold_roa) {
            debug!(time = %t, "Threshold not reached by both products");
            return Ok(StepOutcome::BelowThreshold);
        }

        let core_table = extract_objects(
            &core_field,
            &core_grid,
            &self.extraction_config(&self.config.core, params.threshold_core, params.min_pixels),
        )?;
        let roa_table = extract_objects(
            &roa_field,
            &roa_grid,
            &self.extraction_config(&self.config.roa, params.threshold_roa, params.min_pixels),
        )?;
        if core_table.is_empty() || roa_table.is_empty() {
            debug!(time = %t, "No objects after filtering");
            return Ok(StepOutcome::NoObjects);
        }

        let output_dir = &self.config.output_dir;
        save_table(
            &core_table,
            &table_dir(output_dir, "core", &threshold_tag(params.threshold_core)),
            t,
        )?;
        save_table(
            &roa_table,
            &table_dir(output_dir, "roa", &threshold_tag(params.threshold_roa)),
            t,
        )?;

        let fss = if core_field.shape() == roa_field.shape() {
            fss_multi(
                &exceedance_fraction(&core_field, params.threshold_core),
                &exceedance_fraction(&roa_field, params.threshold_roa),
                &self.config.fss_windows,
            )?
        } else {
            debug!(
                time = %t,
                core = ?core_field.shape(),
                roa = ?roa_field.shape(),
                "Cropped shapes differ, skipping FSS"
            );
            Vec::new()
        };

        Ok(StepOutcome::Saved {
            core_objects: core_table.len(),
            roa_objects: roa_table.len(),
            fss,
        })
    }

    fn extraction_config(
        &self,
        product: &ProductConfig,
        threshold: f64,
        min_pixels: usize,
    ) -> ObjectExtractionConfig {
        ObjectExtractionConfig::new(threshold, product.name.clone())
            .with_connectivity(self.config.connectivity)
            .with_min_pixels(min_pixels)
            .with_min_area_km2(self.config.min_area_km2)
    }

    /// Load a product and crop it to the region.
    ///
    /// `None` when the file is missing.
    fn load_cropped(&self, source: &dyn FieldSource, t: NaiveDateTime) -> Result<Option<Cropped>> {
        let field = match source.load(t) {
            Ok(field) => field,
            Err(SourceError::NotFound(path)) => {
                info!(time = %t, path = %path.display(), "Missing file");
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to load {t}")),
        };

        let grid = match GeodesicGrid::new(
            &field.lats,
            &field.lons,
            self.config.region,
            self.config.fill_value,
        ) {
            Ok(grid) => grid,
            Err(e) if e.is_skippable() => return Ok(Some(Cropped::OutOfDomain)),
            Err(e) => return Err(e.into()),
        };
        let data = grid.crop(&field.data)?;
        Ok(Some(Cropped::Ready(grid, data)))
    }
}

enum Cropped {
    Ready(GeodesicGrid, Grid2D<f32>),
    OutOfDomain,
}

fn reaches(field: &Grid2D<f32>, threshold: f64) -> bool {
    field.as_slice().iter().any(|&v| f64::from(v) >= threshold)
}
