use thiserror::Error;

#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum QscoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("tool execution error: {0}")]
    ToolExecution(String),

    #[error("calibration error: {0}")]
    Calibration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QscoreError>;
