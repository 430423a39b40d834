//! Setup workflow orchestration
//!
//! Load, question pipeline, persist, upsert trigger, render — in that
//! order. The trigger lands as soon as the configuration is saved: a render
//! that fails afterwards (declined lineage overwrite, filesystem error)
//! must not lose the reconciliation signal, because the next session would
//! compare the new credentials against themselves and never re-emit it.

use crate::config::ConfigStore;
use crate::probes::AwsValidator;
use crate::prompt::Prompter;
use crate::questions::{self, Session};
use crate::render::Renderer;
use anyhow::Result;
use std::path::PathBuf;

/// Arguments for the setup command.
#[derive(Debug, Clone)]
pub struct SetupArgs {
    /// Persisted configuration file.
    pub config_path: PathBuf,

    /// Template source tree.
    pub template_dir: PathBuf,

    /// Destination root for rendered environment files.
    pub env_dir: PathBuf,

    /// Overwrite artifacts of a different lineage without asking.
    pub force: bool,
}

/// What one setup run produced.
#[derive(Debug)]
pub struct SetupOutcome {
    pub first_run: bool,
    /// Upsert trigger path, when credentials changed.
    pub trigger: Option<PathBuf>,
    /// Rendered artifact paths.
    pub written: Vec<PathBuf>,
}

/// Run the full setup against the given prompter and credential validator.
pub fn run_with(
    args: &SetupArgs,
    prompter: &mut dyn Prompter,
    validator: &dyn AwsValidator,
) -> Result<SetupOutcome> {
    let mut store = ConfigStore::new(&args.config_path);
    let mut doc = store.load();
    let first_run = store.first_run();

    let mut session = Session::new(&mut *prompter, first_run, validator);
    questions::run_pipeline(&mut doc, &mut session)?;
    let upserts = session.upserts;

    store.save(&doc)?;
    let trigger = upserts.write(&args.env_dir)?;

    let renderer = if args.force {
        Renderer::new(&doc).force()
    } else {
        Renderer::new(&doc)
    };
    let written = renderer.render_tree(&args.template_dir, &args.env_dir, prompter)?;

    Ok(SetupOutcome {
        first_run,
        trigger,
        written,
    })
}
