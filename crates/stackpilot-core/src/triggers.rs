//! Upsert trigger file for changed database credentials
//!
//! When a question session changes stored database logins after first run,
//! a trigger file is left for the orchestration layer's startup routine to
//! reconcile the users inside the containers. The file is consumed and
//! removed externally, never by this crate.

use crate::error::CoreError;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Trigger file name, written next to the rendered environment files.
pub const TRIGGER_FILE: &str = ".upsert_db_users";

/// One identity whose credentials changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertEntry {
    pub identity: String,
    /// True when a prior identity is being removed, not merely re-secured.
    pub delete_previous: bool,
}

/// Accumulated credential changes from one question session.
#[derive(Debug, Default)]
pub struct UpsertPlan {
    entries: Vec<UpsertEntry>,
    password_only: bool,
}

impl UpsertPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a changed or replaced identity.
    pub fn record_identity(&mut self, identity: impl Into<String>, delete_previous: bool) {
        self.entries.push(UpsertEntry {
            identity: identity.into(),
            delete_previous,
        });
    }

    /// Record a password rotation with no identity attached (e.g. Redis).
    /// Produces an empty trigger file if no identity entries join it.
    pub fn record_password_rotation(&mut self) {
        self.password_only = true;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && !self.password_only
    }

    pub fn entries(&self) -> &[UpsertEntry] {
        &self.entries
    }

    /// File content: one `<identity>\t<deletion-flag>` line per entry,
    /// empty for a pure password rotation.
    pub fn content(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\t{}\n", e.identity, e.delete_previous))
            .collect()
    }

    /// Write the trigger into `dir`. No file is written when nothing
    /// changed.
    pub fn write(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if self.is_empty() {
            return Ok(None);
        }
        std::fs::create_dir_all(dir).map_err(|e| CoreError::filesystem(dir, e))?;
        let path = dir.join(TRIGGER_FILE);
        std::fs::write(&path, self.content()).map_err(|e| CoreError::filesystem(&path, e))?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_replacement_with_deletion() {
        let mut plan = UpsertPlan::new();
        plan.record_identity("user", true);
        assert_eq!(plan.content(), "user\ttrue\n");
    }

    #[test]
    fn test_password_change_keeps_identity() {
        let mut plan = UpsertPlan::new();
        plan.record_identity("user", false);
        assert_eq!(plan.content(), "user\tfalse\n");
    }

    #[test]
    fn test_password_only_rotation_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = UpsertPlan::new();
        plan.record_password_rotation();

        let path = plan.write(dir.path()).unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_no_change_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plan = UpsertPlan::new();
        assert!(plan.write(dir.path()).unwrap().is_none());
        assert!(!dir.path().join(TRIGGER_FILE).exists());
    }
}
