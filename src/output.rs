use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{MergedData, ModeSummary};
use crate::error::{ErrorKind, TransitResult};

pub const STOPS_FILE: &str = "stops.geojson";
pub const LINES_FILE: &str = "lines.geojson";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub mode: String,
    pub kind: ErrorKind,
    pub error: String,
}

/// Written next to the merged collections so a partial download is obvious
#[derive(Debug, Serialize)]
pub struct Report {
    pub fetched_at: DateTime<Utc>,
    pub stops: usize,
    pub lines: usize,
    pub modes: Vec<ModeSummary>,
    pub failures: Vec<FailureReport>,
}

impl Report {
    pub fn new(merged: &MergedData) -> Self {
        Report {
            fetched_at: Utc::now(),
            stops: merged.stops.features.len(),
            lines: merged.lines.features.len(),
            modes: merged.modes.clone(),
            failures: merged
                .failures
                .iter()
                .map(|f| FailureReport {
                    mode: f.mode.clone(),
                    kind: f.kind(),
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Write `stops.geojson`, `lines.geojson` and `report.json` into `dir`, creating it if needed
pub fn write_merged(dir: &Path, merged: &MergedData) -> TransitResult<Report> {
    fs::create_dir_all(dir)?;

    write_json(&dir.join(STOPS_FILE), &merged.stops)?;
    write_json(&dir.join(LINES_FILE), &merged.lines)?;

    let report = Report::new(merged);
    write_json(&dir.join(REPORT_FILE), &report)?;

    Ok(report)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> TransitResult<()> {
    log::debug!("Writing {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
