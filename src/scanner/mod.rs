//! Scanner module containing the bounded scan engine and the host probe

pub mod engine;
pub mod probe;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Protocol;
use crate::fingerprint::{Fingerprint, MatchField};

pub use engine::ScanEngine;
pub use probe::HostProbe;

/// A progress notification is emitted every this many completed probes.
pub const PROGRESS_INTERVAL: usize = 100;

/// One unit of work: a candidate address and its dispatch position.
/// Owned exclusively by the probe executing it.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub index: usize,
    pub address: String,
}

/// A candidate that answered with the baseline's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Candidate address that served the baseline content
    pub address: String,

    /// HTTP status code of the first (only) response
    pub status: u16,

    /// Which fingerprint field(s) matched
    pub field: MatchField,

    /// Title the candidate served, if any
    pub title: Option<String>,

    /// Body byte length the candidate served
    pub body_len: usize,
}

/// Shared progress state, updated under mutual exclusion by every probe
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Completed probes, matches and failures included. Monotonic.
    pub completed: usize,

    /// Probes that produced a MatchResult
    pub matched: usize,

    /// Probes that failed at the network level (counted, never fatal)
    pub errors: usize,
}

/// Final report for one scan run
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Domain whose origin was hunted
    pub domain: String,

    /// Protocol used for baseline and probes
    pub protocol: Protocol,

    /// The reference fingerprint every candidate was compared against
    pub baseline: Fingerprint,

    /// Matches in the order they were observed
    pub matches: Vec<MatchResult>,

    /// Total probes completed
    pub scanned: usize,

    /// Probes that failed at the network level
    pub errors: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Wall-clock duration of the dispatch-and-drain phase
    pub duration_ms: u64,
}

impl ScanReport {
    pub fn new(domain: String, protocol: Protocol, baseline: Fingerprint) -> Self {
        let now = Utc::now();
        Self {
            domain,
            protocol,
            baseline,
            matches: Vec::new(),
            scanned: 0,
            errors: 0,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    /// Record the drain completing
    pub fn finish(&mut self, summary: &ScanSummary, elapsed: Duration) {
        self.scanned = summary.completed;
        self.errors = summary.errors;
        self.finished_at = Utc::now();
        self.duration_ms = elapsed.as_millis() as u64;
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
