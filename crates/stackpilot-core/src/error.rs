//! Error taxonomy for setup and operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the core. Validation errors never reach this type:
/// they are handled in place by the prompt retry loop.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The configuration document cannot produce a complete artifact set
    /// (unresolved template placeholder, unknown backup group, missing
    /// derived value). Fatal, not retried.
    #[error("configuration integrity error: {0}")]
    ConfigIntegrity(String),

    /// The orchestration subprocess exited non-zero.
    #[error("external tool failed (exit code {code}): {output}")]
    ExternalTool { code: i32, output: String },

    /// Credential validation failed after the bounded retry budget.
    #[error("credential validation failed: {0}")]
    Credential(String),

    /// A directory or file could not be created or written.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operator declined an overwrite of artifacts belonging to a
    /// different configuration lineage.
    #[error("destination {} belongs to a different installation (lineage mismatch)", .0.display())]
    LineageMismatch(PathBuf),

    /// The prompt source was exhausted or interrupted mid-question.
    #[error("prompt aborted: {0}")]
    PromptAborted(String),
}

impl CoreError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
