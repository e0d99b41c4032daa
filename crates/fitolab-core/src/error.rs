use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FitolabError {
    #[error("repository error: {0}")]
    Repository(String),

    #[error("sample {0} not found")]
    SampleNotFound(Uuid),

    #[error("rule {0} not found")]
    RuleNotFound(Uuid),

    #[error("invalid rule: {0}")]
    RuleInvalid(String),

    #[error("failed to load rules from {path}: {reason}")]
    RuleLoad { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FitolabError {
    /// True for failures of the storage layer (as opposed to bad input).
    pub fn is_repository(&self) -> bool {
        matches!(
            self,
            FitolabError::Repository(_) | FitolabError::Io(_) | FitolabError::Json(_)
        )
    }
}
