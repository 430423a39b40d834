//! Bounded wait for the front end to come up after a start
//!
//! Polls the HTTP health endpoint on a fixed interval. When the budget is
//! exhausted the operator chooses between waiting another round, restarting
//! the front-end stack, or giving up. A retry loop, not concurrency.

use crate::compose::{self, ComposeInvocation};
use crate::config::ConfigDocument;
use crate::prompt::Prompter;
use crate::resolver;
use anyhow::Result;
use std::time::Duration;
use url::Url;

/// Poll interval between health probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Probes per round before the operator is consulted.
pub const POLLS_PER_ROUND: u32 = 24;

/// Health-check URL for the current configuration.
pub fn health_url(doc: &ConfigDocument) -> Result<Url> {
    let scheme = if doc.get_bool("use_letsencrypt") {
        "https"
    } else {
        "http"
    };
    let host = format!(
        "{}.{}",
        doc.get_str("app_subdomain"),
        doc.get_str("public_domain_name")
    );
    let port = resolver::effective_public_port(doc);
    let url = Url::parse(&format!("{}://{}:{}/health", scheme, host, port))?;
    Ok(url)
}

/// Outcome of one readiness wait.
#[derive(Debug, PartialEq, Eq)]
pub enum Readiness {
    Healthy,
    GaveUp,
}

/// Wait until the front end answers its health endpoint. Each exhausted
/// round asks the operator whether to keep waiting, restart the front-end
/// stack, or stop waiting.
pub async fn wait_for_frontend(
    doc: &ConfigDocument,
    restart: &ComposeInvocation,
    prompter: &mut dyn Prompter,
) -> Result<Readiness> {
    let url = health_url(doc)?;

    loop {
        for _ in 0..POLLS_PER_ROUND {
            if crate::probes::http_healthy(&url).await {
                return Ok(Readiness::Healthy);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let keep_waiting = prompter.confirm(
            &format!("{} is not answering yet. Keep waiting?", url),
            true,
        )?;
        if keep_waiting {
            continue;
        }

        let try_restart = prompter.confirm("Restart the front-end stack and retry?", false)?;
        if try_restart {
            compose::run(restart).await?;
            continue;
        }

        return Ok(Readiness::GaveUp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url_follows_proxy_mode() {
        let mut doc = ConfigDocument::defaults();
        doc.set_str("public_domain_name", "example.org");
        doc.set_port("exposed_http_port", 8081);
        assert_eq!(
            health_url(&doc).unwrap().as_str(),
            "http://app.example.org:8081/health"
        );

        doc.set_bool("use_proxy", true);
        doc.set_bool("use_letsencrypt", true);
        assert_eq!(
            health_url(&doc).unwrap().as_str(),
            "https://app.example.org/health"
        );
    }
}
