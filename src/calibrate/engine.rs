use crate::calibrate::corpus;
use crate::calibrate::matrix::MeasureMatrix;
use crate::error::Result;
use crate::eval::registry::StrategyRegistry;
use crate::model::import;
use crate::model::quality_model::QualityModel;
use crate::tools;
use crate::types::config::RunConfig;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the persisted project-by-measure matrix artifact.
pub const MATRIX_FILE: &str = "benchmark_data.csv";

#[derive(Debug)]
pub struct Calibration {
    pub projects: usize,
    pub matrix_path: PathBuf,
    pub model_path: PathBuf,
    pub thresholds: BTreeMap<String, [f64; 3]>,
}

/// Runs the whole calibration pipeline: discover benchmark projects, fan
/// out per-project analysis up to the measure tier, assemble and persist the
/// matrix, derive thresholds through the model's benchmarker, fill weights
/// through its weighter, and export the calibrated model description.
pub fn run_calibration(
    corpus_root: &Path,
    marker: &str,
    model_path: &Path,
    config: &RunConfig,
    registry: &StrategyRegistry,
    output_dir: &Path,
) -> Result<Calibration> {
    let template = import::import_quality_model(model_path, registry)?;
    let project_roots = corpus::discover_projects(corpus_root, marker)?;
    tracing::info!(
        projects = project_roots.len(),
        "beginning benchmark repository analysis"
    );

    fs::create_dir_all(output_dir)?;
    let scratch_root = output_dir.join("benchmark_results");

    // each project owns its clone, tool runs and intermediate files; rows
    // synchronize only here, at matrix assembly
    let rows: Vec<(String, BTreeMap<String, f64>)> = project_roots
        .par_iter()
        .map(|project_root| benchmark_project(project_root, &template, config, &scratch_root))
        .collect::<Result<Vec<_>>>()?;

    let matrix = MeasureMatrix::from_rows(rows)?;
    let matrix_path = output_dir.join(MATRIX_FILE);
    matrix.write_csv(&matrix_path)?;

    let thresholds = template.benchmarker.derive_thresholds(
        &matrix,
        &matrix_path,
        output_dir,
        config.calibration.as_ref(),
    )?;

    let mut calibrated = template.clone();
    calibrated.apply_thresholds(&thresholds)?;
    calibrated.apply_weights();
    let model_out = calibrated.export_description(output_dir)?;
    tracing::info!(model = %model_out.display(), "calibration complete");

    Ok(Calibration {
        projects: project_roots.len(),
        matrix_path,
        model_path: model_out,
        thresholds,
    })
}

/// One benchmark project's row: clone the template, run the adapters, merge
/// findings and evaluate up through the measure tier only.
fn benchmark_project(
    project_root: &Path,
    template: &QualityModel,
    config: &RunConfig,
    scratch_root: &Path,
) -> Result<(String, BTreeMap<String, f64>)> {
    let project_name = project_root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| project_root.display().to_string());
    tracing::debug!(project = %project_name, "analyzing benchmark project");

    let mut model = template.clone();
    let scratch = scratch_root.join(&project_name);
    let (results, loc) = tools::collect_results(project_root, config, &scratch)?;

    model.inject_lines_of_code(loc as f64);
    model.attach_tool_findings(&results);
    model.evaluate_measures()?;

    Ok((project_name, model.measure_values()))
}
