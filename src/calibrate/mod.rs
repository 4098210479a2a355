pub mod corpus;
pub mod engine;
pub mod matrix;
pub mod thresholds;

use crate::error::{QscoreError, Result};
use crate::types::config::CalibrationConfig;
use matrix::MeasureMatrix;
use std::collections::BTreeMap;
use std::path::Path;

/// Derives a weight per child of a node, summing to 1.0 across siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighter {
    /// Equal weighting across siblings.
    Naive,
}

impl Weighter {
    pub fn key(&self) -> &'static str {
        match self {
            Weighter::Naive => "naive",
        }
    }

    pub fn weights(&self, children: &[String]) -> BTreeMap<String, f64> {
        match self {
            Weighter::Naive => {
                if children.is_empty() {
                    return BTreeMap::new();
                }
                let share = 1.0 / children.len() as f64;
                children
                    .iter()
                    .map(|name| (name.clone(), share))
                    .collect()
            }
        }
    }
}

/// Derives measure thresholds from the benchmark matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmarker {
    /// Minimum / median / maximum of each measure column, derived
    /// in-process.
    Naive,
    /// Delegates to the configured external statistical procedure.
    External,
}

impl Benchmarker {
    pub fn key(&self) -> &'static str {
        match self {
            Benchmarker::Naive => "naive",
            Benchmarker::External => "external",
        }
    }

    /// Produces an ordered breakpoint triple per measure. The persisted
    /// matrix artifact must exist before derivation regardless of strategy;
    /// thresholds are never silently left empty.
    pub fn derive_thresholds(
        &self,
        matrix: &MeasureMatrix,
        matrix_path: &Path,
        work_dir: &Path,
        config: Option<&CalibrationConfig>,
    ) -> Result<BTreeMap<String, [f64; 3]>> {
        if !matrix_path.is_file() {
            return Err(QscoreError::Calibration(format!(
                "benchmark matrix missing at {}",
                matrix_path.display()
            )));
        }

        match self {
            Benchmarker::Naive => Ok(naive_thresholds(matrix)),
            Benchmarker::External => {
                let config = config.ok_or_else(|| {
                    QscoreError::Configuration(
                        "external benchmarker requires a [calibration] section in the run config"
                            .to_string(),
                    )
                })?;
                thresholds::run_external(matrix_path, work_dir, config)
            }
        }
    }
}

fn naive_thresholds(matrix: &MeasureMatrix) -> BTreeMap<String, [f64; 3]> {
    let mut out = BTreeMap::new();
    for name in &matrix.measure_names {
        let mut values = matrix.column(name).unwrap_or_default();
        if values.is_empty() {
            continue;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        out.insert(
            name.clone(),
            [values[0], median(&values), values[values.len() - 1]],
        );
    }
    out
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
