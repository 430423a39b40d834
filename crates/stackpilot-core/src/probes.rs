//! Narrow interfaces to external collaborators
//!
//! Reachability and credential checks live behind small synchronous-looking
//! seams so the question engine and readiness loop can be tested with
//! stubs.

use anyhow::Result;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use url::Url;

/// True when a TCP connection to `host:port` opens within the timeout.
pub fn tcp_port_open(host: &str, port: u16, timeout: Duration) -> bool {
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(_) => return false,
    };
    for addr in addrs {
        if TcpStream::connect_timeout(&addr, timeout).is_ok() {
            return true;
        }
    }
    false
}

/// HTTP health probe: a 2xx response means healthy.
pub async fn http_healthy(url: &Url) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    match client.get(url.clone()).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// AWS credential set collected by the credentials topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket_name: String,
}

impl AwsCredentials {
    /// Validation cannot even be attempted while any field is blank.
    pub fn any_blank(&self) -> bool {
        self.access_key_id.is_empty()
            || self.secret_access_key.is_empty()
            || self.region.is_empty()
            || self.bucket_name.is_empty()
    }
}

/// External credential validation routine. The real check (request signing
/// against the storage endpoint) is delegated; this seam only reports
/// valid / not valid.
pub trait AwsValidator {
    fn validate(&self, credentials: &AwsCredentials) -> Result<bool>;
}

/// Default validator: probes the bucket endpoint for reachability. A
/// signature-level check happens later inside the backup containers.
pub struct EndpointValidator;

impl AwsValidator for EndpointValidator {
    fn validate(&self, credentials: &AwsCredentials) -> Result<bool> {
        let host = format!(
            "{}.s3.{}.amazonaws.com",
            credentials.bucket_name, credentials.region
        );
        Ok(tcp_port_open(&host, 443, Duration::from_secs(5)))
    }
}

pub mod stub {
    use super::*;
    use std::cell::RefCell;

    /// Scripted validator for tests: returns canned verdicts in order and
    /// counts how many validation calls were actually made.
    pub struct StubValidator {
        verdicts: RefCell<Vec<bool>>,
        pub calls: RefCell<usize>,
    }

    impl StubValidator {
        pub fn new(verdicts: Vec<bool>) -> Self {
            Self {
                verdicts: RefCell::new(verdicts),
                calls: RefCell::new(0),
            }
        }
    }

    impl AwsValidator for StubValidator {
        fn validate(&self, _credentials: &AwsCredentials) -> Result<bool> {
            *self.calls.borrow_mut() += 1;
            let mut verdicts = self.verdicts.borrow_mut();
            if verdicts.is_empty() {
                Ok(false)
            } else {
                Ok(verdicts.remove(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unroutable_port_is_closed() {
        // TEST-NET-1 address, guaranteed unassigned.
        assert!(!tcp_port_open(
            "192.0.2.1",
            9,
            Duration::from_millis(200)
        ));
    }

    #[test]
    fn test_blank_detection() {
        let mut creds = AwsCredentials::default();
        assert!(creds.any_blank());
        creds.access_key_id = "AKIA".into();
        creds.secret_access_key = "secret".into();
        creds.region = "eu-west-1".into();
        assert!(creds.any_blank());
        creds.bucket_name = "backups".into();
        assert!(!creds.any_blank());
    }
}
