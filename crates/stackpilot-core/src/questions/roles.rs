//! Topology and server-role questions
//!
//! Role combinations are locked out by construction: answering the role
//! questions always rewrites both `server_role` and `backend_role`, so a
//! secondary backend can never remain a frontend host from an earlier
//! session.

use super::Session;
use crate::config::ConfigDocument;
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let multi = session.prompter.confirm(
        "Spread services over several servers?",
        doc.get_bool("multi_server"),
    )?;
    doc.set_bool("multi_server", multi);

    if !multi {
        // Single instance runs everything; role keys return to defaults so
        // a later switch to multi-server starts clean.
        doc.set_str("server_role", "frontend");
        doc.set_str("backend_role", "primary");
        return Ok(());
    }

    let role = session.prompter.select(
        "Which role does this server play?",
        &[
            ("frontend", "Frontend (web server, user-facing)"),
            ("backend", "Backend (databases and application services)"),
        ],
        &doc.get_str("server_role"),
    )?;
    doc.set_str("server_role", &role);

    if role == "backend" {
        let backend_role = session.prompter.select(
            "Is this the primary backend or a secondary?",
            &[
                ("primary", "Primary (authoritative databases)"),
                ("secondary", "Secondary (replica)"),
            ],
            &doc.get_str("backend_role"),
        )?;
        doc.set_str("backend_role", backend_role);
    } else {
        doc.set_str("backend_role", "primary");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::stub::StubValidator;
    use crate::prompt::ScriptedPrompter;
    use crate::resolver::{self, Role};

    #[test]
    fn test_secondary_backend_cannot_stay_frontend() {
        // Document left over from a session where this host was a frontend.
        let mut doc = ConfigDocument::defaults();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "frontend");

        let mut prompter = ScriptedPrompter::new(["y", "backend", "secondary"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, false, &validator);
        run(&mut doc, &mut session).unwrap();

        assert_eq!(doc.get_str("server_role"), "backend");
        assert_eq!(doc.get_str("backend_role"), "secondary");
        assert_eq!(resolver::role(&doc), Role::SecondaryBackend);
    }

    #[test]
    fn test_frontend_choice_resets_backend_role() {
        let mut doc = ConfigDocument::defaults();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "backend");
        doc.set_str("backend_role", "secondary");

        let mut prompter = ScriptedPrompter::new(["y", "frontend"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, false, &validator);
        run(&mut doc, &mut session).unwrap();

        assert_eq!(doc.get_str("server_role"), "frontend");
        assert_eq!(doc.get_str("backend_role"), "primary");
    }

    #[test]
    fn test_single_instance_resets_role_keys() {
        let mut doc = ConfigDocument::defaults();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "backend");
        doc.set_str("backend_role", "secondary");

        let mut prompter = ScriptedPrompter::new(["n"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, false, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(!doc.get_bool("multi_server"));
        assert_eq!(resolver::role(&doc), Role::Single);
        assert_eq!(doc.get_str("backend_role"), "primary");
    }
}
