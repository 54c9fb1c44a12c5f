//! Object tracker CLI.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use object_tracker::timesteps::parse_timestamp;
use object_tracker::{merge_tables, Pipeline, RunParams, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "object-tracker")]
#[command(about = "Extract and compare objects in two gridded products", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract objects for every time step in a range
    Run {
        /// First time step, YYYYMMDDHHMM
        start: String,

        /// Last time step, YYYYMMDDHHMM (inclusive)
        end: String,

        /// Threshold for the core product
        thresh_core: f64,

        /// Threshold for the roa product
        thresh_roa: f64,

        /// Minimum object size in pixels
        min_pixels: usize,

        /// Configuration file path
        #[arg(short, long, env = "TRACKER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Merge the per-step tables of one product and threshold
    Merge {
        /// Product: core or roa
        product: String,

        /// Threshold, e.g. 1.0 or thr_1p0
        thresh: String,

        /// Directory holding the <product>/<tag> folders
        base_path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    match cli.command {
        Commands::Run {
            start,
            end,
            thresh_core,
            thresh_roa,
            min_pixels,
            config,
        } => {
            let config = TrackerConfig::load(config.as_deref())?;
            config
                .validate()
                .map_err(|e| anyhow!("Invalid configuration: {e}"))?;
            info!(
                output_dir = %config.output_dir.display(),
                region = ?config.region,
                step_minutes = config.step_minutes,
                "Loaded configuration"
            );

            let params = RunParams {
                start: parse_timestamp(&start)?,
                end: parse_timestamp(&end)?,
                threshold_core: thresh_core,
                threshold_roa: thresh_roa,
                min_pixels,
            };

            let core = config.core.source.open()?;
            let roa = config.roa.source.open()?;
            let pipeline = Pipeline::new(config, core, roa);

            let summary = pipeline.run(&params)?;
            if summary.failed > 0 {
                return Err(anyhow!(
                    "{} of {} time steps failed",
                    summary.failed,
                    summary.steps
                ));
            }
            Ok(())
        }
        Commands::Merge {
            product,
            thresh,
            base_path,
        } => {
            let summary = merge_tables(&product, &thresh, &base_path)?;
            info!(output = %summary.output.display(), "Saved");
            Ok(())
        }
    }
}
