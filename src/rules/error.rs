use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("Failed to read ruleset file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse ruleset JSON")]
    Parse(#[from] serde_json::Error),
}
