//! Compose invocation building and execution
//!
//! The core produces an ordered argument list for the external `docker`
//! process; it does not manage that process beyond passing arguments and a
//! working directory and surfacing a non-zero exit.

use crate::config::ConfigDocument;
use crate::error::CoreError;
use crate::resolver::{self, Role};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

/// Operator-supplied override file, injected when present in the env dir.
pub const CUSTOM_OVERRIDE_FILE: &str = "docker-compose.custom.yml";

/// One orchestrated stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    Frontend,
    Backend,
    Maintenance,
}

impl Stack {
    fn compose_file(&self, doc: &ConfigDocument) -> &'static str {
        match self {
            Stack::Frontend => "docker-compose.frontend.yml",
            Stack::Backend => {
                if doc.get_str("backend_role") == "secondary" {
                    "docker-compose.backend.secondary.yml"
                } else {
                    "docker-compose.backend.primary.yml"
                }
            }
            Stack::Maintenance => "docker-compose.maintenance.yml",
        }
    }

    fn prefix(&self, doc: &ConfigDocument) -> String {
        match self {
            Stack::Maintenance => resolver::maintenance_prefix(doc),
            _ => resolver::compose_prefix(doc),
        }
    }
}

/// The stacks the current role is responsible for, in start order.
pub fn stacks_for_role(doc: &ConfigDocument) -> Vec<Stack> {
    match resolver::role(doc) {
        Role::Single => vec![Stack::Backend, Stack::Frontend],
        Role::Frontend => vec![Stack::Frontend],
        Role::PrimaryBackend | Role::SecondaryBackend => vec![Stack::Backend],
    }
}

/// A fully-built external invocation: `docker <args>` run in `working_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeInvocation {
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

/// Build the ordered argument list for one stack and subcommand:
/// compose-file selector, project prefix, custom override injection,
/// subcommand tokens.
pub fn invocation(
    doc: &ConfigDocument,
    env_dir: &Path,
    stack: Stack,
    subcommand: &[&str],
) -> ComposeInvocation {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        stack.compose_file(doc).to_string(),
        "-p".to_string(),
        stack.prefix(doc),
    ];

    if env_dir.join(CUSTOM_OVERRIDE_FILE).exists() {
        args.push("-f".to_string());
        args.push(CUSTOM_OVERRIDE_FILE.to_string());
    }

    args.extend(subcommand.iter().map(|s| s.to_string()));

    ComposeInvocation {
        working_dir: env_dir.to_path_buf(),
        args,
    }
}

/// Run an invocation, streaming its output to the terminal. A non-zero exit
/// surfaces the captured tail of the output to the operator.
pub async fn run(invocation: &ComposeInvocation) -> Result<()> {
    let mut child = TokioCommand::new("docker")
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CoreError::filesystem(&invocation.working_dir, e))?;

    // Stderr is drained on its own task so neither pipe can fill up and
    // stall the child.
    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut captured = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                eprintln!("  {}", line);
                push_capped(&mut captured, line);
            }
            captured
        })
    });

    let mut captured: Vec<String> = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("  {}", line);
            push_capped(&mut captured, line);
        }
    }

    if let Some(task) = stderr_task {
        if let Ok(stderr_lines) = task.await {
            captured.extend(stderr_lines);
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| CoreError::filesystem(&invocation.working_dir, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(CoreError::ExternalTool {
            code: status.code().unwrap_or(-1),
            output: captured.join("\n"),
        }
        .into())
    }
}

// Keep only the tail of the output for the error report.
fn push_capped(captured: &mut Vec<String>, line: String) {
    const CAP: usize = 50;
    captured.push(line);
    if captured.len() > CAP {
        captured.remove(0);
    }
}
