//! Template tree rendering
//!
//! Walks a directory of template sources, renders every file carrying the
//! reserved `.tpl` extension against the configuration document, and writes
//! the resulting artifacts under a destination root. A lineage marker ties
//! the destination to one configuration; rendering over artifacts produced
//! by a different configuration requires explicit confirmation.

pub mod parser;

use crate::config::ConfigDocument;
use crate::error::CoreError;
use crate::prompt::Prompter;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reserved extension marking a file for substitution; stripped on output.
pub const TEMPLATE_EXT: &str = "tpl";

/// Lineage marker file co-located with rendered artifacts.
pub const MARKER_FILE: &str = ".stackpilot_id";

/// Renders one template tree for one configuration document.
pub struct Renderer {
    ctx: BTreeMap<String, String>,
    unique_id: String,
    force: bool,
}

impl Renderer {
    pub fn new(doc: &ConfigDocument) -> Self {
        Self {
            ctx: doc.render_context(),
            unique_id: doc.get_str("unique_id"),
            force: false,
        }
    }

    /// Skip the lineage confirmation and overwrite unconditionally.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Render `src` into `dest`. Every artifact is produced in memory
    /// before anything is written, so an unresolved placeholder never
    /// leaves a partially-substituted tree behind. Returns the rendered
    /// artifact paths.
    pub fn render_tree(
        &self,
        src: &Path,
        dest: &Path,
        prompter: &mut dyn Prompter,
    ) -> Result<Vec<PathBuf>> {
        self.check_lineage(dest, prompter)?;

        // Phase 1: render everything in memory, fail fast.
        let mut artifacts: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                CoreError::ConfigIntegrity(format!("cannot walk template tree: {}", e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(src)
                .expect("walkdir yields paths under its root");

            let content = std::fs::read(entry.path())
                .map_err(|e| CoreError::filesystem(entry.path(), e))?;

            if entry.path().extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXT) {
                let source = String::from_utf8(content).map_err(|_| {
                    CoreError::ConfigIntegrity(format!(
                        "template {} is not valid UTF-8",
                        entry.path().display()
                    ))
                })?;
                let nodes = parser::parse(&source)?;
                let rendered = parser::render(&nodes, &self.ctx)?;
                artifacts.push((rel.with_extension(""), rendered.into_bytes()));
            } else {
                artifacts.push((rel.to_path_buf(), content));
            }
        }

        // Phase 2: write artifacts and the lineage marker.
        let mut written = Vec::with_capacity(artifacts.len());
        for (rel, bytes) in artifacts {
            let target = dest.join(&rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CoreError::filesystem(parent, e))?;
            }
            std::fs::write(&target, &bytes).map_err(|e| CoreError::filesystem(&target, e))?;
            written.push(target);
        }

        let marker = dest.join(MARKER_FILE);
        std::fs::write(&marker, &self.unique_id).map_err(|e| CoreError::filesystem(&marker, e))?;

        Ok(written)
    }

    /// Compare the persisted lineage marker against the current document.
    /// On mismatch the operator must explicitly confirm the overwrite
    /// (default: decline) unless force is set.
    fn check_lineage(&self, dest: &Path, prompter: &mut dyn Prompter) -> Result<()> {
        let marker = dest.join(MARKER_FILE);
        let existing = match std::fs::read_to_string(&marker) {
            Ok(id) => id.trim().to_string(),
            Err(_) => return Ok(()), // first render into this destination
        };

        if existing == self.unique_id || self.force {
            return Ok(());
        }

        let overwrite = prompter.confirm(
            &format!(
                "{} was created by a different installation. Overwrite its files?",
                dest.display()
            ),
            false,
        )?;
        if overwrite {
            Ok(())
        } else {
            Err(CoreError::LineageMismatch(dest.to_path_buf()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn doc() -> ConfigDocument {
        let mut doc = ConfigDocument::defaults();
        doc.set_str("unique_id", "1700000000");
        doc.set_str("redis_password", "secret");
        doc.set_str("public_domain_name", "example.org");
        doc
    }

    fn write_templates(dir: &Path) {
        std::fs::create_dir_all(dir.join("env")).unwrap();
        std::fs::write(
            dir.join("env/redis.conf.tpl"),
            "{% if REDIS_PASSWORD %}\nrequirepass ${REDIS_PASSWORD}\n{% endif REDIS_PASSWORD %}\nbind 0.0.0.0\n",
        )
        .unwrap();
        std::fs::write(dir.join("env/static.txt"), "verbatim\n").unwrap();
    }

    #[test]
    fn test_renders_tree_and_strips_extension() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_templates(src.path());

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let written = Renderer::new(&doc())
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap();

        assert_eq!(written.len(), 2);
        let conf = std::fs::read_to_string(dest.path().join("env/redis.conf")).unwrap();
        assert_eq!(conf, "requirepass secret\nbind 0.0.0.0\n");
        assert_eq!(
            std::fs::read_to_string(dest.path().join("env/static.txt")).unwrap(),
            "verbatim\n"
        );
        assert_eq!(
            std::fs::read_to_string(dest.path().join(MARKER_FILE)).unwrap(),
            "1700000000"
        );
    }

    #[test]
    fn test_rerender_is_byte_identical() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_templates(src.path());
        let renderer = Renderer::new(&doc());

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        renderer
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap();
        let first = std::fs::read(dest.path().join("env/redis.conf")).unwrap();

        renderer
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap();
        let second = std::fs::read(dest.path().join("env/redis.conf")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lineage_mismatch_declined_aborts() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_templates(src.path());
        std::fs::write(dest.path().join(MARKER_FILE), "9999999999").unwrap();

        let mut prompter = ScriptedPrompter::new(["n"]);
        let err = Renderer::new(&doc())
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap_err();
        assert!(err.to_string().contains("different installation"));
        assert!(!dest.path().join("env/redis.conf").exists());
    }

    #[test]
    fn test_lineage_mismatch_confirmed_overwrites_marker() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_templates(src.path());
        std::fs::write(dest.path().join(MARKER_FILE), "9999999999").unwrap();

        let mut prompter = ScriptedPrompter::new(["y"]);
        Renderer::new(&doc())
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.path().join(MARKER_FILE)).unwrap(),
            "1700000000"
        );
    }

    #[test]
    fn test_force_skips_confirmation() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_templates(src.path());
        std::fs::write(dest.path().join(MARKER_FILE), "9999999999").unwrap();

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        Renderer::new(&doc())
            .force()
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap();
    }

    #[test]
    fn test_unresolved_placeholder_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("bad.env.tpl"), "X=${NO_SUCH_SETTING}\n").unwrap();

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = Renderer::new(&doc())
            .render_tree(src.path(), dest.path(), &mut prompter)
            .unwrap_err();
        assert!(err.to_string().contains("NO_SUCH_SETTING"));
        assert!(!dest.path().join("bad.env").exists());
        assert!(!dest.path().join(MARKER_FILE).exists());
    }
}
