//! Stackpilot Core - configuration and orchestration for a multi-container web stack
//!
//! This library drives an installer/operator CLI: it accumulates a set of
//! interdependent settings through conditional interactive questions,
//! migrates older persisted configurations to the current schema, and
//! deterministically renders the result into the artifacts the container
//! orchestration layer consumes.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - configuration store, schema migration,
//!   derived-value resolver, template renderer, compose argument builder
//! - **Layer 2: Workflow Orchestration** - the question pipeline over a
//!   [`prompt::Prompter`] seam, testable without a terminal
//! - **Layer 3: CLI/TUI Interface** - cliclack-based setup workflow
//!   (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-backed prompter and setup flow

pub mod compose;
pub mod config;
pub mod error;
pub mod probes;
pub mod prompt;
pub mod questions;
pub mod readiness;
pub mod render;
pub mod resolver;
pub mod setup;
pub mod triggers;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{ConfigDocument, ConfigStore};
pub use error::CoreError;
pub use render::Renderer;
pub use setup::{SetupArgs, SetupOutcome};
pub use triggers::UpsertPlan;

#[cfg(feature = "tui")]
pub use tui::run_setup;
