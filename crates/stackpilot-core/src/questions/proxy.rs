//! Reverse-proxy and TLS questions
//!
//! The branch tree here is the densest in the pipeline: the Let's Encrypt
//! email is asked only when TLS terminates on the proxy, a custom proxy
//! port only when it does not, and every branch writes the whole topic key
//! set so switching branches between sessions leaves nothing stale.

use super::Session;
use crate::config::schema::TLS_RESERVED_PORTS;
use crate::config::ConfigDocument;
use crate::prompt::{ask_validated, validate, Prompter};
use crate::resolver::{self, Role};
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    match resolver::role(doc) {
        Role::PrimaryBackend | Role::SecondaryBackend => {
            // Backend nodes serve no public traffic; the topic still owns
            // its keys and resets them.
            doc.set_bool("use_proxy", false);
            doc.set_bool("use_letsencrypt", false);
            doc.set_str("letsencrypt_email", "");
            doc.set_str("proxy_port", "8080");
            doc.set_str("exposed_http_port", "80");
            return Ok(());
        }
        Role::Single | Role::Frontend => {}
    }

    let use_proxy = session.prompter.confirm(
        "Serve through a reverse proxy?",
        doc.get_bool("use_proxy"),
    )?;
    doc.set_bool("use_proxy", use_proxy);

    if use_proxy {
        let use_letsencrypt = session.prompter.confirm(
            "Terminate TLS with Let's Encrypt on the proxy?",
            doc.get_bool("use_letsencrypt"),
        )?;
        doc.set_bool("use_letsencrypt", use_letsencrypt);

        if use_letsencrypt {
            let email = ask_validated(
                session.prompter,
                "Email address for Let's Encrypt expiry notices",
                &doc.get_str("letsencrypt_email"),
                validate::email,
            )?;
            doc.set_str("letsencrypt_email", email);
            doc.set_str("proxy_port", "443");
        } else {
            doc.set_str("letsencrypt_email", "");
            let port = ask_validated(
                session.prompter,
                "Reverse proxy port",
                &doc.get_str("proxy_port"),
                validate::port,
            )?;
            doc.set_str("proxy_port", port);
        }
    } else {
        doc.set_bool("use_letsencrypt", false);
        doc.set_str("letsencrypt_email", "");
        doc.set_str("proxy_port", "8080");
    }

    let exposed = ask_exposed_port(doc, session.prompter)?;
    doc.set_port("exposed_http_port", exposed);

    Ok(())
}

/// The container-exposed HTTP port. Ports reserved by TLS termination are
/// rejected while Let's Encrypt is active, unless explicitly overridden.
fn ask_exposed_port(doc: &ConfigDocument, prompter: &mut dyn Prompter) -> Result<u16> {
    let tls_active = doc.get_bool("use_letsencrypt");
    let default = doc.get_str("exposed_http_port");

    loop {
        let raw = prompter.input("Exposed HTTP port", &default)?;
        let port = match validate::port(raw.trim()) {
            Ok(p) => p.parse::<u16>().unwrap_or(0),
            Err(message) => {
                prompter.note_error(&message)?;
                continue;
            }
        };

        if tls_active && TLS_RESERVED_PORTS.contains(&port) {
            let keep = prompter.confirm(
                &format!("Port {} is reserved by TLS termination. Use it anyway?", port),
                false,
            )?;
            if !keep {
                prompter.note_error(&format!(
                    "Port {} is reserved while Let's Encrypt is enabled",
                    port
                ))?;
                continue;
            }
        }

        return Ok(port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::stub::StubValidator;
    use crate::prompt::ScriptedPrompter;

    fn session_doc() -> ConfigDocument {
        ConfigDocument::defaults()
    }

    #[test]
    fn test_letsencrypt_branch_sets_email_and_port() {
        let mut doc = session_doc();
        let mut prompter =
            ScriptedPrompter::new(["y", "y", "ops@example.org", "8080"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(doc.get_bool("use_proxy"));
        assert!(doc.get_bool("use_letsencrypt"));
        assert_eq!(doc.get_str("letsencrypt_email"), "ops@example.org");
        assert_eq!(doc.get_port("proxy_port"), 443);
        assert_eq!(doc.get_port("exposed_http_port"), 8080);
    }

    #[test]
    fn test_proxy_without_tls_asks_custom_port_and_clears_email() {
        let mut doc = session_doc();
        doc.set_str("letsencrypt_email", "stale@example.org");

        let mut prompter = ScriptedPrompter::new(["y", "n", "8443", "8080"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(!doc.get_bool("use_letsencrypt"));
        assert_eq!(doc.get_str("letsencrypt_email"), "");
        assert_eq!(doc.get_port("proxy_port"), 8443);
    }

    #[test]
    fn test_no_proxy_branch_clears_dependents() {
        let mut doc = session_doc();
        doc.set_bool("use_letsencrypt", true);
        doc.set_str("letsencrypt_email", "stale@example.org");

        let mut prompter = ScriptedPrompter::new(["n", "80"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(!doc.get_bool("use_proxy"));
        assert!(!doc.get_bool("use_letsencrypt"));
        assert_eq!(doc.get_str("letsencrypt_email"), "");
        assert_eq!(doc.get_port("exposed_http_port"), 80);
    }

    #[test]
    fn test_tls_reserved_port_is_rejected_and_reprompted() {
        let mut doc = session_doc();
        // proxy + letsencrypt + email, then 443 (declined override), then 8080
        let mut prompter = ScriptedPrompter::new([
            "y",
            "y",
            "ops@example.org",
            "443",
            "n",
            "8080",
        ]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert_eq!(doc.get_port("exposed_http_port"), 8080);
        assert!(prompter
            .errors
            .iter()
            .any(|e| e.contains("reserved")));
    }

    #[test]
    fn test_tls_reserved_port_explicit_override() {
        let mut doc = session_doc();
        let mut prompter =
            ScriptedPrompter::new(["y", "y", "ops@example.org", "443", "y"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert_eq!(doc.get_port("exposed_http_port"), 443);
    }

    #[test]
    fn test_backend_role_resets_proxy_keys_without_prompting() {
        let mut doc = session_doc();
        doc.set_bool("multi_server", true);
        doc.set_str("server_role", "backend");
        doc.set_bool("use_letsencrypt", true);

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(!doc.get_bool("use_letsencrypt"));
    }
}
