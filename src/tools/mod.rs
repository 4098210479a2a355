use crate::error::{QscoreError, Result};
use crate::model::finding::Finding;
use crate::types::config::{LocToolConfig, RunConfig, ToolConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Findings grouped by the diagnostic name they belong to, as parsed from
/// one tool's raw results.
pub type ToolResults = BTreeMap<String, Vec<Finding>>;

/// Contract for external static-analysis tool adapters: run against a
/// project root, then parse the raw results location into findings per
/// diagnostic.
pub trait Tool {
    fn name(&self) -> &str;

    /// Runs the tool; returns the location of its raw results.
    fn analyze(&self, project_root: &Path) -> Result<PathBuf>;

    /// Parses raw results into findings grouped by diagnostic name.
    fn parse(&self, results: &Path) -> Result<ToolResults>;
}

/// Adapter backed by a configured external command that leaves the
/// normalized findings JSON in its output directory:
/// `{ "<diagnostic>": [ { "filePath": ..., "lineNumber": ...,
/// "characterNumber": ..., "severity": ... }, ... ] }`.
pub struct CommandTool {
    name: String,
    command: Vec<String>,
    output_dir: PathBuf,
    results_file: String,
}

impl CommandTool {
    pub fn from_config(config: &ToolConfig, output_dir: &Path) -> Self {
        Self {
            name: config.name.clone(),
            command: config.command.clone(),
            output_dir: output_dir.to_path_buf(),
            results_file: config
                .results_file
                .clone()
                .unwrap_or_else(|| format!("{}.json", config.name)),
        }
    }
}

impl Tool for CommandTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, project_root: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        run_command(&self.name, &self.command, project_root, &self.output_dir)?;

        let results = self.output_dir.join(&self.results_file);
        if !results.is_file() {
            return Err(QscoreError::ToolExecution(format!(
                "tool {} produced no results file at {}",
                self.name,
                results.display()
            )));
        }
        Ok(results)
    }

    fn parse(&self, results: &Path) -> Result<ToolResults> {
        let raw = fs::read_to_string(results)?;
        serde_json::from_str(&raw).map_err(|e| {
            QscoreError::ToolExecution(format!(
                "tool {}: unparsable results {}: {e}",
                self.name,
                results.display()
            ))
        })
    }
}

/// The distinguished lines-of-code adapter. Its results file carries a
/// single integer.
pub struct LocTool {
    name: String,
    command: Vec<String>,
    output_dir: PathBuf,
    results_file: String,
}

impl LocTool {
    pub fn from_config(config: &LocToolConfig, output_dir: &Path) -> Self {
        Self {
            name: config.name.clone(),
            command: config.command.clone(),
            output_dir: output_dir.to_path_buf(),
            results_file: config
                .results_file
                .clone()
                .unwrap_or_else(|| "loc.txt".to_string()),
        }
    }

    pub fn measure(&self, project_root: &Path) -> Result<u64> {
        fs::create_dir_all(&self.output_dir)?;
        run_command(&self.name, &self.command, project_root, &self.output_dir)?;

        let results = self.output_dir.join(&self.results_file);
        let raw = fs::read_to_string(&results).map_err(|e| {
            QscoreError::ToolExecution(format!(
                "tool {} produced no readable results at {}: {e}",
                self.name,
                results.display()
            ))
        })?;
        raw.trim().parse::<u64>().map_err(|_| {
            QscoreError::ToolExecution(format!(
                "tool {} produced a non-integer lines-of-code figure: {}",
                self.name,
                raw.trim()
            ))
        })
    }
}

/// Runs every configured adapter plus the LOC adapter against the project,
/// flattening all tool results into a single diagnostic-name mapping.
/// Any adapter failure aborts the whole collection.
pub fn collect_results(
    project_root: &Path,
    config: &RunConfig,
    scratch_dir: &Path,
) -> Result<(ToolResults, u64)> {
    let mut all_results: ToolResults = BTreeMap::new();
    for tool_config in &config.tools {
        let tool = CommandTool::from_config(tool_config, scratch_dir);
        tracing::debug!(tool = %tool.name(), "running analysis tool");
        let raw = tool.analyze(project_root)?;
        for (diagnostic, findings) in tool.parse(&raw)? {
            all_results.entry(diagnostic).or_default().extend(findings);
        }
    }

    let loc = LocTool::from_config(&config.loc, scratch_dir).measure(project_root)?;
    Ok((all_results, loc))
}

fn substitute(arg: &str, project_root: &Path, output_dir: &Path) -> String {
    arg.replace("{project}", &project_root.display().to_string())
        .replace("{output}", &output_dir.display().to_string())
}

fn run_command(
    name: &str,
    command: &[String],
    project_root: &Path,
    output_dir: &Path,
) -> Result<()> {
    let mut parts = command.iter();
    let program = parts.next().ok_or_else(|| {
        QscoreError::Configuration(format!("tool {name} has an empty command"))
    })?;
    let args: Vec<String> = parts
        .map(|arg| substitute(arg, project_root, output_dir))
        .collect();

    let output = Command::new(substitute(program, project_root, output_dir))
        .args(&args)
        .output()
        .map_err(|e| QscoreError::ToolExecution(format!("tool {name} failed to start: {e}")))?;

    if !output.status.success() {
        return Err(QscoreError::ToolExecution(format!(
            "tool {name} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}
