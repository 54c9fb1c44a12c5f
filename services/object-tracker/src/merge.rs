//! Merge the per-time-step tables of one product and threshold.

use anyhow::{bail, ensure, Context, Result};
use chrono::{Datelike, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::timesteps::{parse_timestamp, threshold_tag_from_str};

/// Products the tracker writes.
pub const PRODUCTS: [&str; 2] = ["core", "roa"];

/// Columns appended to every merged row.
const TIME_COLUMNS: [&str; 5] = ["time", "year", "month", "day", "hour"];

/// Outcome of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub files: usize,
    pub rows: usize,
}

/// Concatenate `<base>/<product>/<tag>/*.csv` into
/// `<base>/merged/<product>_<tag>.csv`, adding time columns parsed from each
/// file name.
///
/// `threshold` is taken as typed, with or without a `thr_` prefix.
pub fn merge_tables(product: &str, threshold: &str, base: &Path) -> Result<MergeSummary> {
    let product = product.trim().to_lowercase();
    ensure!(
        PRODUCTS.contains(&product.as_str()),
        "PRODUCT must be one of {:?}, got '{}'",
        PRODUCTS,
        product
    );

    let tag = threshold_tag_from_str(threshold);
    let input_dir = base.join(&product).join(&tag);
    ensure!(
        input_dir.is_dir(),
        "Folder not found: {}",
        input_dir.display()
    );

    let files = list_csv_files(&input_dir)?;
    if files.is_empty() {
        bail!("No CSV files found in {}", input_dir.display());
    }

    let output_dir = base.join("merged");
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    let output = output_dir.join(format!("{product}_{tag}.csv"));
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut header: Option<csv::StringRecord> = None;
    let mut rows = 0;
    for (i, file) in files.iter().enumerate() {
        if i % 1000 == 0 {
            debug!(file = i, total = files.len(), "Reading tables");
        }

        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Unreadable file name: {}", file.display()))?;
        let time = parse_timestamp(stem)
            .with_context(|| format!("File name is not a time step: {}", file.display()))?;
        let time_values = [
            time.format("%Y-%m-%d %H:%M:%S").to_string(),
            time.year().to_string(),
            time.month().to_string(),
            time.day().to_string(),
            time.hour().to_string(),
        ];

        let mut reader = csv::Reader::from_path(file)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        let file_header = reader.headers()?.clone();
        match &header {
            None => {
                let mut full = file_header.clone();
                for column in TIME_COLUMNS {
                    full.push_field(column);
                }
                writer.write_record(&full)?;
                header = Some(file_header);
            }
            Some(expected) => ensure!(
                *expected == file_header,
                "Column mismatch in {}: expected {:?}, found {:?}",
                file.display(),
                expected,
                file_header
            ),
        }

        for record in reader.records() {
            let mut record =
                record.with_context(|| format!("Malformed row in {}", file.display()))?;
            for value in &time_values {
                record.push_field(value);
            }
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(output = %output.display(), files = files.len(), rows, "Merged tables");
    Ok(MergeSummary {
        output,
        files: files.len(),
        rows,
    })
}

/// `*.csv` directly inside `dir`, sorted by name.
fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "csv") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "label,size,n_pix,mean_core,max_core";

    fn write(dir: &Path, name: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_merge_adds_time_columns() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("core/thr_1p0");
        write(&dir, "202407011215.csv", &format!("{HEADER}\n1,50.0,3,2.0,4.0\n"));
        write(&dir, "202407011200.csv", &format!("{HEADER}\n1,90.0,5,2.5,5.0\n2,20.0,1,1.0,1.0\n"));
        write(&dir, "notes.txt", "ignored");

        let summary = merge_tables("CORE", "1.0", tmp.path()).unwrap();
        assert_eq!(summary.output, tmp.path().join("merged/core_thr_1p0.csv"));
        assert_eq!(summary.files, 2);
        assert_eq!(summary.rows, 3);

        let content = fs::read_to_string(&summary.output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], format!("{HEADER},time,year,month,day,hour"));
        // Sorted by file name, so 12:00 comes first.
        assert_eq!(lines[1], "1,90.0,5,2.5,5.0,2024-07-01 12:00:00,2024,7,1,12");
        assert!(lines[3].ends_with("2024-07-01 12:15:00,2024,7,1,12"));
    }

    #[test]
    fn test_threshold_prefix_accepted() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("roa/thr_0p5"), "202401010000.csv", "label\n1\n");
        let summary = merge_tables("roa", "thr_0.5", tmp.path()).unwrap();
        assert_eq!(summary.output, tmp.path().join("merged/roa_thr_0p5.csv"));
    }

    #[test]
    fn test_merge_errors() {
        let tmp = TempDir::new().unwrap();
        let err = merge_tables("rdt", "1.0", tmp.path()).unwrap_err();
        assert!(err.to_string().contains("PRODUCT"));

        let err = merge_tables("core", "1.0", tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Folder not found"));

        fs::create_dir_all(tmp.path().join("core/thr_1p0")).unwrap();
        let err = merge_tables("core", "1.0", tmp.path()).unwrap_err();
        assert!(err.to_string().contains("No CSV files"));
    }

    #[test]
    fn test_column_mismatch() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("core/thr_1p0");
        write(&dir, "202401010000.csv", "label,size\n1,2\n");
        write(&dir, "202401010015.csv", "label,n_pix\n1,2\n");
        let err = merge_tables("core", "1.0", tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Column mismatch"));
    }

    #[test]
    fn test_bad_file_name() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("core/thr_1p0"), "latest.csv", "label\n1\n");
        assert!(merge_tables("core", "1.0", tmp.path()).is_err());
    }
}
