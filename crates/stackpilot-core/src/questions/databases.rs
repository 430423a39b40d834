//! Database credential and sizing questions
//!
//! Any answer that changes a stored login is compared against the previous
//! value; after the first configuration such changes feed the upsert
//! trigger so the orchestration layer reconciles users inside the
//! containers.

use super::Session;
use crate::config::ConfigDocument;
use crate::prompt::{ask_password, ask_password_or_clear, ask_validated, validate};
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    postgres(doc, session)?;
    if doc.get_bool("advanced") {
        mongo(doc, session)?;
    }
    redis(doc, session)?;
    Ok(())
}

fn postgres(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let prev_user = doc.get_str("postgres_user");
    let prev_password = doc.get_str("postgres_password");

    let user = ask_validated(
        session.prompter,
        "PostgreSQL user",
        &prev_user,
        validate::identifier,
    )?;
    let password = ask_password(session.prompter, "PostgreSQL password", &prev_password)?;

    doc.set_str("postgres_user", &user);
    doc.set_str("postgres_password", &password);

    if doc.get_bool("advanced") {
        let api_db = ask_validated(
            session.prompter,
            "PostgreSQL database (API)",
            &doc.get_str("postgres_db_api"),
            validate::identifier,
        )?;
        doc.set_str("postgres_db_api", api_db);

        let reports_db = ask_validated(
            session.prompter,
            "PostgreSQL database (reports)",
            &doc.get_str("postgres_db_reports"),
            validate::identifier,
        )?;
        doc.set_str("postgres_db_reports", reports_db);

        let ram = ask_validated(
            session.prompter,
            "RAM dedicated to PostgreSQL (GB)",
            &doc.get_str("postgres_ram"),
            |raw| validate::integer_in(raw, 1, 64),
        )?;
        doc.set_str("postgres_ram", ram);

        let profile = session.prompter.select(
            "PostgreSQL tuning profile",
            &[
                ("Mixed", "Mixed workload"),
                ("OLTP", "Many small transactions"),
                ("DW", "Analytics / data warehouse"),
            ],
            &doc.get_str("postgres_profile"),
        )?;
        doc.set_str("postgres_profile", profile);
    }

    record_identity_change(
        session,
        &prev_user,
        &user,
        &prev_password,
        &password,
        "Delete the previous PostgreSQL user inside the containers?",
    )?;

    Ok(())
}

fn mongo(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let prev_root = doc.get_str("mongo_root_user");
    let prev_root_password = doc.get_str("mongo_root_password");
    let prev_user = doc.get_str("mongo_user");
    let prev_password = doc.get_str("mongo_password");

    let root = ask_validated(
        session.prompter,
        "MongoDB root user",
        &prev_root,
        validate::identifier,
    )?;
    let root_password = ask_password(session.prompter, "MongoDB root password", &prev_root_password)?;
    let user = ask_validated(
        session.prompter,
        "MongoDB application user",
        &prev_user,
        validate::identifier,
    )?;
    let password = ask_password(session.prompter, "MongoDB application password", &prev_password)?;

    doc.set_str("mongo_root_user", &root);
    doc.set_str("mongo_root_password", &root_password);
    doc.set_str("mongo_user", &user);
    doc.set_str("mongo_password", &password);

    record_identity_change(
        session,
        &prev_root,
        &root,
        &prev_root_password,
        &root_password,
        "Delete the previous MongoDB root user inside the containers?",
    )?;
    record_identity_change(
        session,
        &prev_user,
        &user,
        &prev_password,
        &password,
        "Delete the previous MongoDB application user inside the containers?",
    )?;

    Ok(())
}

fn redis(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let prev = doc.get_str("redis_password");
    let password = ask_password_or_clear(session.prompter, "Redis password", &prev)?;
    doc.set_str("redis_password", &password);

    // Redis has no named identity; a rotation alone still needs the
    // orchestration layer to reconcile.
    if !session.first_run && password != prev {
        session.upserts.record_password_rotation();
    }

    Ok(())
}

/// Compare a user/password pair against its previous values and record the
/// upsert entry the orchestration layer needs. No entry on first run.
fn record_identity_change(
    session: &mut Session,
    prev_user: &str,
    user: &str,
    prev_password: &str,
    password: &str,
    delete_prompt: &str,
) -> Result<()> {
    if session.first_run {
        return Ok(());
    }

    if user != prev_user && !prev_user.is_empty() {
        let delete_previous = session.prompter.confirm(delete_prompt, false)?;
        session.upserts.record_identity(prev_user, delete_previous);
    } else if password != prev_password {
        session.upserts.record_identity(user, false);
    }

    Ok(())
}
