//! Loader errors and per-file outcomes.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Out-of-range threshold, broken `extends` chain, duplicate id.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// What happened to one file during a directory scan.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug, PartialEq)]
pub enum LoadStatus {
    Loaded { rule_id: String },
    Skipped { reason: String },
    Failed { error: String },
}

impl LoadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}
