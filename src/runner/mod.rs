use crate::error::{QscoreError, Result};
use crate::eval::registry::StrategyRegistry;
use crate::model::import;
use crate::tools;
use crate::types::config::RunConfig;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Assessment {
    pub score: f64,
    pub export_path: PathBuf,
}

/// Runs one project end-to-end, in strict order: load and validate the
/// model, clone the template, run every tool adapter, inject the
/// lines-of-code figure, merge findings, evaluate, export. A model that
/// fails validation never triggers a tool run, and a failing tool aborts
/// the whole evaluation; a partial score would silently misrepresent the
/// project.
pub fn assess_project(
    project_root: &Path,
    output_dir: &Path,
    model_path: &Path,
    config: &RunConfig,
    registry: &StrategyRegistry,
) -> Result<Assessment> {
    let template = import::import_quality_model(model_path, registry)?;
    template.validate_for_evaluation()?;

    let mut project_model = template.clone();
    let scratch = output_dir.join("tool_results");

    let (results, loc) = tools::collect_results(project_root, config, &scratch)?;
    if loc == 0 {
        return Err(QscoreError::Validation(
            "lines of code figure must be positive".to_string(),
        ));
    }
    tracing::info!(loc, tools = config.tools.len(), "tool analysis complete");

    project_model.inject_lines_of_code(loc as f64);
    project_model.attach_tool_findings(&results);

    let score = project_model.evaluate()?;
    let export_path = project_model.export_evaluation(output_dir)?;
    tracing::info!(score, path = %export_path.display(), "project evaluation complete");

    Ok(Assessment { score, export_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder;
    use crate::model::export::export_quality_model;
    use crate::types::config::{LocToolConfig, ToolConfig};
    use std::fs;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn loc_config(script: &str) -> LocToolConfig {
        LocToolConfig {
            name: "loc".to_string(),
            command: sh(script),
            results_file: None,
        }
    }

    fn write_template(dir: &Path) -> PathBuf {
        let template = builder::quality_model("Runner QM");
        export_quality_model(&template, dir, "qscore_model_runner")
            .expect("template should export")
    }

    #[test]
    fn assessment_runs_end_to_end() {
        let project = TempDir::new().expect("project dir should be created");
        let output = TempDir::new().expect("output dir should be created");
        let model_dir = TempDir::new().expect("model dir should be created");
        let model_path = write_template(model_dir.path());

        let config = RunConfig {
            tools: Vec::new(),
            loc: loc_config("printf 100 > {output}/loc.txt"),
            calibration: None,
        };
        let registry = StrategyRegistry::with_builtins();

        let assessment = assess_project(
            project.path(),
            output.path(),
            &model_path,
            &config,
            &registry,
        )
        .expect("assessment should succeed");

        // builder template: every measure is 6 findings / 100 loc, weights
        // halve at each composite tier, so the index equals 0.06
        assert!((assessment.score - 0.06).abs() < 1e-9);
        assert!(assessment.export_path.is_file());
    }

    #[test]
    fn tool_findings_merge_into_matching_diagnostics() {
        let project = TempDir::new().expect("project dir should be created");
        let output = TempDir::new().expect("output dir should be created");
        let model_dir = TempDir::new().expect("model dir should be created");
        let model_path = write_template(model_dir.path());

        // one extra finding for a known diagnostic plus one unknown rule,
        // which is dropped with a warning
        let diagnostic = "QA01_ProductFactor 01_Measure 01_Diagnostic 01";
        let findings = format!(
            concat!(
                r#"{{"{diag}": [{{"filePath": "fresh.rs", "lineNumber": 10, "#,
                r#""characterNumber": 1, "severity": 2}}], "unknown-rule": "#,
                r#"[{{"filePath": "x.rs", "lineNumber": 1, "characterNumber": 1, "#,
                r#""severity": 1}}]}}"#,
            ),
            diag = diagnostic
        );
        let findings_file = project.path().join("findings.json");
        fs::write(&findings_file, findings).expect("findings should write");

        let config = RunConfig {
            tools: vec![ToolConfig {
                name: "scan".to_string(),
                command: sh(&format!(
                    "cp {} {{output}}/scan.json",
                    findings_file.display()
                )),
                results_file: None,
            }],
            loc: loc_config("printf 100 > {output}/loc.txt"),
            calibration: None,
        };
        let registry = StrategyRegistry::with_builtins();

        let assessment = assess_project(
            project.path(),
            output.path(),
            &model_path,
            &config,
            &registry,
        )
        .expect("assessment should succeed");

        // the matched diagnostic now counts 4 findings in its measure: the
        // affected measure normalizes to 7 / 100 instead of 6 / 100
        assert!(assessment.score > 0.06);

        let exported =
            fs::read_to_string(&assessment.export_path).expect("export should read back");
        assert!(exported.contains("fresh.rs"));
        assert!(!exported.contains("unknown-rule"));
    }

    #[test]
    fn failing_tool_aborts_without_an_export() {
        let project = TempDir::new().expect("project dir should be created");
        let output = TempDir::new().expect("output dir should be created");
        let model_dir = TempDir::new().expect("model dir should be created");
        let model_path = write_template(model_dir.path());

        let config = RunConfig {
            tools: vec![ToolConfig {
                name: "broken".to_string(),
                command: sh("exit 1"),
                results_file: None,
            }],
            loc: loc_config("printf 100 > {output}/loc.txt"),
            calibration: None,
        };
        let registry = StrategyRegistry::with_builtins();

        let err = assess_project(
            project.path(),
            output.path(),
            &model_path,
            &config,
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, QscoreError::ToolExecution(_)));

        let export_written = fs::read_dir(output.path())
            .expect("output dir should read")
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name().to_string_lossy().starts_with("qscore_eval"));
        assert!(!export_written, "no evaluation export on tool failure");
    }

    #[test]
    fn incomplete_weights_fail_before_any_tool_runs() {
        let project = TempDir::new().expect("project dir should be created");
        let output = TempDir::new().expect("output dir should be created");
        let model_dir = TempDir::new().expect("model dir should be created");

        // explicit measure list but no weights object: the product factor
        // has a child with no corresponding weight
        let model_path = model_dir.path().join("unweighted.json");
        fs::write(
            &model_path,
            r#"{
                "name": "Unweighted QM",
                "factors": {
                    "tqi": { "T": { "description": "t", "weights": { "A": 1.0 } } },
                    "quality_aspects": { "A": { "description": "a", "weights": { "P": 1.0 } } },
                    "product_factors": { "P": { "description": "p", "measures": ["M"] } }
                },
                "measures": {
                    "M": {
                        "description": "m",
                        "positive": false,
                        "diagnostics": [
                            { "name": "D", "description": "d", "toolName": "scan" }
                        ]
                    }
                }
            }"#,
        )
        .expect("model description should write");

        // the loc tool would leave a marker file if it ever ran
        let marker = output.path().join("tool-ran");
        let config = RunConfig {
            tools: Vec::new(),
            loc: loc_config(&format!(
                "touch {} && printf 100 > {{output}}/loc.txt",
                marker.display()
            )),
            calibration: None,
        };
        let registry = StrategyRegistry::with_builtins();

        let err = assess_project(
            project.path(),
            output.path(),
            &model_path,
            &config,
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, QscoreError::Validation(_)));
        assert!(!marker.exists(), "validation must pre-empt tool execution");
    }

    #[test]
    fn zero_lines_of_code_is_a_validation_error() {
        let project = TempDir::new().expect("project dir should be created");
        let output = TempDir::new().expect("output dir should be created");
        let model_dir = TempDir::new().expect("model dir should be created");
        let model_path = write_template(model_dir.path());

        let config = RunConfig {
            tools: Vec::new(),
            loc: loc_config("printf 0 > {output}/loc.txt"),
            calibration: None,
        };
        let registry = StrategyRegistry::with_builtins();

        let err = assess_project(
            project.path(),
            output.path(),
            &model_path,
            &config,
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, QscoreError::Validation(_)));
    }
}
