//! Baseline capture
//!
//! One GET against the real, CDN-fronted domain before any probe starts.
//! This request goes through normal DNS resolution and normal TLS
//! validation; the spoofing tricks are reserved for candidate probes.
//! Without a baseline there is nothing to compare against, so every failure
//! here is fatal.

use std::time::Duration;

use crate::config::Protocol;
use crate::error::{Result, ScanError};
use crate::fingerprint::Fingerprint;

/// Reference fingerprint captured from the public domain
#[derive(Debug, Clone)]
pub struct Baseline {
    pub fingerprint: Fingerprint,
    pub protocol: Protocol,
}

impl Baseline {
    /// Capture the baseline: fetch `<protocol>://<domain>/` and fingerprint
    /// the response body. Runs exactly once per scan, before dispatch.
    pub async fn capture(protocol: Protocol, domain: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;

        let url = format!("{}://{}/", protocol.scheme(), domain);
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScanError::Baseline(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Baseline(format!(
                "{} answered with status {}",
                url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::Baseline(format!("Failed to read body from {}: {}", url, e)))?;

        let fingerprint = Fingerprint::from_bytes(&body);
        if fingerprint.title.is_none() {
            log::warn!(
                "{} has no <title>; matching will rely on body length alone",
                domain
            );
        }

        Ok(Self {
            fingerprint,
            protocol,
        })
    }
}
