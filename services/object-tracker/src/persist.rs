//! CSV persistence for object tables and FSS summaries.
//!
//! Layout under the output directory:
//!
//! ```text
//! <output_dir>/<product>/<tag>/<YYYYMMDDHHMM>.csv   one object table per step
//! <output_dir>/fss/<core_tag>_<roa_tag>.csv         time, window, fss
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use field_objects::ObjectTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::timesteps::format_timestamp;

/// One FSS score between the two products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FssRow {
    /// `YYYYMMDDHHMM`
    pub time: String,
    pub window: usize,
    pub fss: f64,
}

/// Folder holding one product's tables at one threshold.
pub fn table_dir(output_dir: &Path, product: &str, tag: &str) -> PathBuf {
    output_dir.join(product).join(tag)
}

/// Write `table` to `<dir>/<YYYYMMDDHHMM>.csv`, creating `dir` if needed.
pub fn save_table(table: &ObjectTable, dir: &Path, time: NaiveDateTime) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(format!("{}.csv", format_timestamp(time)));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(table.column_names())?;
    for record in table {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), objects = table.len(), "Saved object table");
    Ok(path)
}

/// Write the FSS summary, sorted by time then window.
pub fn save_fss(rows: &[FssRow], output_dir: &Path, core_tag: &str, roa_tag: &str) -> Result<PathBuf> {
    let dir = output_dir.join("fss");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| a.time.cmp(&b.time).then(a.window.cmp(&b.window)));

    let path = dir.join(format!("{core_tag}_{roa_tag}.csv"));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "Saved FSS summary");
    Ok(path)
}
