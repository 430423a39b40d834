//! Interactive question engine
//!
//! Each topic is one cohesive group of questions over a single concern. A
//! topic reads prior answers from the document, asks only the prompts whose
//! preconditions hold, validates each answer with a bounded retry loop, and
//! writes every key it owns back — including explicitly clearing keys whose
//! branch was not taken, so no stale value survives a changed answer.
//!
//! Topics compose into a fixed pipeline; the derived-value resolver runs
//! last to re-establish cross-field invariants.

pub mod backups;
pub mod credentials;
pub mod databases;
pub mod installation;
pub mod network;
pub mod proxy;
pub mod roles;

use crate::config::ConfigDocument;
use crate::probes::AwsValidator;
use crate::prompt::Prompter;
use crate::resolver;
use crate::triggers::UpsertPlan;
use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared state for one question session.
pub struct Session<'a> {
    pub prompter: &'a mut dyn Prompter,
    /// True when no prior configuration existed; credential changes do not
    /// emit upsert triggers on the very first configuration.
    pub first_run: bool,
    pub aws_validator: &'a dyn AwsValidator,
    /// Credential changes accumulated across topics.
    pub upserts: UpsertPlan,
}

impl<'a> Session<'a> {
    pub fn new(
        prompter: &'a mut dyn Prompter,
        first_run: bool,
        aws_validator: &'a dyn AwsValidator,
    ) -> Self {
        Self {
            prompter,
            first_run,
            aws_validator,
            upserts: UpsertPlan::new(),
        }
    }
}

/// Run every topic in pipeline order, then apply derived values and assign
/// the installation identity if this lineage does not have one yet.
pub fn run_pipeline(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    installation::run(doc, session)?;
    roles::run(doc, session)?;
    network::run(doc, session)?;
    proxy::run(doc, session)?;
    databases::run(doc, session)?;
    backups::run(doc, session)?;
    credentials::run(doc, session)?;

    resolver::apply(doc);

    // unique_id is immutable across renders once assigned; it ties rendered
    // artifacts to this configuration lineage.
    if doc.get_str("unique_id").is_empty() {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        doc.set_str("unique_id", stamp.to_string());
    }

    Ok(())
}
