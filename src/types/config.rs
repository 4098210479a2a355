use serde::Deserialize;

/// Run configuration (`qscore.toml`): which external tool adapters to invoke
/// and how to reach the statistical procedure used for calibration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Static-analysis tool adapters. Each produces findings grouped by
    /// diagnostic name.
    #[serde(default, rename = "tool")]
    pub tools: Vec<ToolConfig>,
    /// The distinguished lines-of-code adapter. Exactly one per run; its
    /// figure feeds every measure normalizer.
    pub loc: LocToolConfig,
    pub calibration: Option<CalibrationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    /// Program and arguments; `{project}` and `{output}` are substituted
    /// before invocation.
    pub command: Vec<String>,
    /// Results file the command leaves in its output directory. Defaults to
    /// `<name>.json`.
    pub results_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocToolConfig {
    #[serde(default = "default_loc_name")]
    pub name: String,
    pub command: Vec<String>,
    /// Defaults to `loc.txt`.
    pub results_file: Option<String>,
}

fn default_loc_name() -> String {
    "loc".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// Program and arguments for the external threshold procedure;
    /// `{input}` receives the matrix path and `{output}` the directory the
    /// procedure must leave `threshold.json` in.
    pub threshold_command: Vec<String>,
}
