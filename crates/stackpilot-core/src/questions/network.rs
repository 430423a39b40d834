//! Domain and inter-server networking questions

use super::Session;
use crate::config::ConfigDocument;
use crate::prompt::{ask_validated, validate};
use crate::resolver::{self, Role};
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let domain = ask_validated(
        session.prompter,
        "Public domain name",
        &doc.get_str("public_domain_name"),
        validate::domain,
    )?;
    doc.set_str("public_domain_name", domain);

    if doc.get_bool("advanced") {
        let app = ask_validated(
            session.prompter,
            "Web application subdomain",
            &doc.get_str("app_subdomain"),
            validate::subdomain,
        )?;
        doc.set_str("app_subdomain", app);

        let api = ask_validated(
            session.prompter,
            "API subdomain",
            &doc.get_str("api_subdomain"),
            validate::subdomain,
        )?;
        doc.set_str("api_subdomain", api);
    }

    // Frontends and secondaries must reach the primary backend; a primary
    // or single instance is the primary and carries no pointer to one.
    match resolver::role(doc) {
        Role::Frontend | Role::SecondaryBackend => {
            let host = ask_validated(
                session.prompter,
                "Primary backend host (IP or domain)",
                &doc.get_str("primary_backend_host"),
                validate::domain,
            )?;
            doc.set_str("primary_backend_host", host);

            let port = ask_validated(
                session.prompter,
                "Primary backend port",
                &doc.get_str("primary_backend_port"),
                validate::port,
            )?;
            doc.set_str("primary_backend_port", port);
        }
        Role::Single | Role::PrimaryBackend => {
            doc.set_str("primary_backend_host", "");
            doc.set_str("primary_backend_port", "8000");
        }
    }

    Ok(())
}
