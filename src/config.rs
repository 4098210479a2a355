use crate::error::{QscoreError, Result};
use crate::types::config::RunConfig;
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "qscore.toml";

pub fn load_config(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        return Err(QscoreError::Configuration(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let config: RunConfig = toml::from_str(&content)
        .map_err(|e| QscoreError::Configuration(format!("{}: {e}", path.display())))?;
    validate(&config, path)?;
    Ok(config)
}

fn validate(config: &RunConfig, path: &Path) -> Result<()> {
    if config.loc.command.is_empty() {
        return Err(QscoreError::Configuration(format!(
            "{}: loc command must not be empty",
            path.display()
        )));
    }

    let mut names = BTreeSet::new();
    for tool in &config.tools {
        if tool.command.is_empty() {
            return Err(QscoreError::Configuration(format!(
                "{}: tool {} has an empty command",
                path.display(),
                tool.name
            )));
        }
        if !names.insert(tool.name.as_str()) {
            return Err(QscoreError::Configuration(format!(
                "{}: duplicate tool name: {}",
                path.display(),
                tool.name
            )));
        }
    }
    Ok(())
}
