use crate::error::{QscoreError, Result};
use crate::types::config::CalibrationConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

/// File the external procedure is expected to leave in its output directory.
pub const THRESHOLD_FILE: &str = "threshold.json";

#[derive(Debug, Deserialize)]
struct ThresholdRecord {
    #[serde(rename = "_row")]
    row: String,
    t1: f64,
    t2: f64,
    t3: f64,
}

/// Invokes the configured statistical procedure exactly once against the
/// persisted matrix and parses its output. The procedure's command receives
/// the matrix path for `{input}` and the working directory for `{output}`.
pub fn run_external(
    matrix_path: &Path,
    work_dir: &Path,
    config: &CalibrationConfig,
) -> Result<BTreeMap<String, [f64; 3]>> {
    fs::create_dir_all(work_dir)?;
    let output_file = work_dir.join(THRESHOLD_FILE);
    // a leftover output from an earlier run must not be mistaken for this one
    if output_file.exists() {
        fs::remove_file(&output_file)?;
    }

    let mut parts = config.threshold_command.iter();
    let program = parts.next().ok_or_else(|| {
        QscoreError::Configuration("calibration threshold_command is empty".to_string())
    })?;
    let args: Vec<String> = parts
        .map(|arg| substitute(arg, matrix_path, work_dir))
        .collect();

    let output = Command::new(substitute(program, matrix_path, work_dir))
        .args(&args)
        .output()
        .map_err(|e| {
            QscoreError::Calibration(format!("threshold procedure failed to start: {e}"))
        })?;
    if !output.status.success() {
        return Err(QscoreError::Calibration(format!(
            "threshold procedure exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    if !output_file.is_file() {
        return Err(QscoreError::Calibration(format!(
            "threshold procedure produced no output file at {}",
            output_file.display()
        )));
    }

    let thresholds = parse_threshold_file(&output_file)?;
    // scoped to this run; remove so a later run cannot pick it up stale
    fs::remove_file(&output_file)?;
    Ok(thresholds)
}

/// Parses the threshold output artifact into a measure-name-to-breakpoints
/// mapping, undoing the separator substitution the external format applies
/// to column names.
pub fn parse_threshold_file(path: &Path) -> Result<BTreeMap<String, [f64; 3]>> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<ThresholdRecord> = serde_json::from_str(&raw).map_err(|e| {
        QscoreError::Calibration(format!(
            "malformed threshold output {}: {e}",
            path.display()
        ))
    })?;

    let mut out = BTreeMap::new();
    for record in records {
        if !(record.t1 <= record.t2 && record.t2 <= record.t3) {
            return Err(QscoreError::Calibration(format!(
                "thresholds for {} are not ordered",
                record.row
            )));
        }
        out.insert(
            normalize_measure_name(&record.row),
            [record.t1, record.t2, record.t3],
        );
    }
    Ok(out)
}

/// The external procedure substitutes dots for the spaces in measure names;
/// map them back to the model's own naming.
pub fn normalize_measure_name(raw: &str) -> String {
    raw.replace('.', " ")
}

fn substitute(arg: &str, matrix_path: &Path, work_dir: &Path) -> String {
    arg.replace("{input}", &matrix_path.display().to_string())
        .replace("{output}", &work_dir.display().to_string())
}
