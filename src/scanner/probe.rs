//! Host probe: one spoofed-Host request against one candidate address
//!
//! The CDN-bypass mechanism: the edge routes on the Host header, so
//! connecting straight to a candidate IP while presenting the target
//! domain's hostname reveals whether that IP actually serves the target's
//! content. Each probe builds its own client so the insecure TLS setting
//! never leaks into shared transport state.

use reqwest::header::HOST;
use reqwest::redirect;
use std::sync::Arc;
use std::time::Duration;

use crate::baseline::Baseline;
use crate::config::Protocol;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::scanner::{MatchResult, ScanTask};

/// Probe for a single candidate address
#[derive(Debug, Clone)]
pub struct HostProbe {
    protocol: Protocol,
    domain: String,
    timeout: Duration,
    baseline: Arc<Baseline>,
}

impl HostProbe {
    pub fn new(
        protocol: Protocol,
        domain: String,
        timeout: Duration,
        baseline: Arc<Baseline>,
    ) -> Self {
        Self {
            protocol,
            domain,
            timeout,
            baseline,
        }
    }

    /// Execute the probe. `Ok(Some(_))` is a match, `Ok(None)` a clean
    /// no-match; `Err` is a network-level failure the engine counts but
    /// never escalates.
    pub async fn run(&self, task: &ScanTask) -> Result<Option<MatchResult>> {
        // Isolated client: certificate validation off for this connection
        // only, and redirects never followed so the comparison always sees
        // the first response.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::none())
            .timeout(self.timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;

        let url = format!("{}://{}/", self.protocol.scheme(), task.address);
        let response = client
            .get(&url)
            .header(HOST, self.domain.as_str())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        let fingerprint = Fingerprint::from_bytes(&body);

        log::debug!(
            "Probe {} ({}): status {}, title {:?}, {} bytes",
            task.address,
            task.index,
            status,
            fingerprint.title,
            fingerprint.body_len
        );

        Ok(fingerprint
            .matches(&self.baseline.fingerprint)
            .map(|field| MatchResult {
                address: task.address.clone(),
                status,
                field,
                title: fingerprint.title,
                body_len: fingerprint.body_len,
            }))
    }
}
