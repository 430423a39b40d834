//! Backup policy questions
//!
//! Schedules are only asked for the backup categories the current
//! role/topology owns; everything else is cleared so a secondary node can
//! never carry a primary-exclusive schedule into the rendered artifacts.

use super::Session;
use crate::config::ConfigDocument;
use crate::prompt::{ask_validated, validate};
use crate::resolver::{self, BackupCategory, Role};
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let use_backup = session
        .prompter
        .confirm("Enable periodic backups?", doc.get_bool("use_backup"))?;
    doc.set_bool("use_backup", use_backup);

    if !use_backup {
        doc.set_bool("run_postgres_backup_from_current_server", false);
        doc.set_bool("run_redis_backup_from_current_server", false);
        for category in BackupCategory::ALL {
            doc.set_str(category.schedule_key(), "");
        }
        return Ok(());
    }

    delegation_flags(doc, session)?;

    for category in BackupCategory::ALL {
        if resolver::owns_backup(doc, category) {
            let default = current_or_default(doc, category);
            let schedule = ask_validated(
                session.prompter,
                &format!("Backup schedule for {} (cron)", category.display_name()),
                &default,
                validate::cron,
            )?;
            doc.set_str(category.schedule_key(), schedule);
        } else {
            doc.set_str(category.schedule_key(), "");
        }
    }

    if doc.get_bool("advanced") {
        let retention = ask_validated(
            session.prompter,
            "Backup retention (days)",
            &doc.get_str("backup_retention_days"),
            |raw| validate::integer_in(raw, 1, 3650),
        )?;
        doc.set_str("backup_retention_days", retention);
    }

    Ok(())
}

/// Postgres and Redis backups can run from either backend; the node that
/// runs them is chosen here. Mongo always runs from the primary and media
/// from the serving host, so neither has a flag.
fn delegation_flags(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    match resolver::role(doc) {
        Role::Single => {
            doc.set_bool("run_postgres_backup_from_current_server", true);
            doc.set_bool("run_redis_backup_from_current_server", true);
        }
        Role::Frontend => {
            doc.set_bool("run_postgres_backup_from_current_server", false);
            doc.set_bool("run_redis_backup_from_current_server", false);
        }
        Role::PrimaryBackend | Role::SecondaryBackend => {
            let primary = resolver::role(doc) == Role::PrimaryBackend;
            let postgres = session.prompter.confirm(
                "Run PostgreSQL backups from this server?",
                doc.get_bool("run_postgres_backup_from_current_server") || primary,
            )?;
            doc.set_bool("run_postgres_backup_from_current_server", postgres);

            let redis = session.prompter.confirm(
                "Run Redis backups from this server?",
                doc.get_bool("run_redis_backup_from_current_server") || primary,
            )?;
            doc.set_bool("run_redis_backup_from_current_server", redis);
        }
    }
    Ok(())
}

fn current_or_default(doc: &ConfigDocument, category: BackupCategory) -> String {
    let current = doc.get_str(category.schedule_key());
    if current.is_empty() {
        crate::config::schema::default_schedule(category).to_string()
    } else {
        current
    }
}
