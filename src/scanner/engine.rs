//! Bounded scan engine
//!
//! Drives one probe per candidate address with at most `jobs` probes in
//! flight, then drains to a full barrier: the engine returns only after
//! every dispatched probe has completed. Probes may complete in any order;
//! the only ordering guarantees are baseline-before-first-probe and
//! all-probes-before-return.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};

use crate::baseline::Baseline;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::output;
use crate::scanner::{HostProbe, ScanReport, ScanSummary, ScanTask, PROGRESS_INTERVAL};

/// Bounded-concurrency scan orchestrator
pub struct ScanEngine {
    config: ScanConfig,
    baseline: Arc<Baseline>,
}

impl ScanEngine {
    /// Create an engine for a validated configuration and a captured
    /// baseline. Configuration errors are fatal here, before any dispatch.
    pub fn new(config: ScanConfig, baseline: Baseline) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            baseline: Arc::new(baseline),
        })
    }

    /// Scan every candidate address and return the aggregated report.
    ///
    /// The dispatch loop blocks on slot acquisition when `jobs` probes are
    /// in flight, launches each probe asynchronously, and moves on without
    /// waiting for completion. After the last dispatch it drains until all
    /// outstanding probes have released their slots.
    pub async fn scan(&self, addresses: Vec<String>) -> Result<ScanReport> {
        let start = Instant::now();
        let mut report = ScanReport::new(
            self.config.domain.clone(),
            self.config.protocol,
            self.baseline.fingerprint.clone(),
        );

        let semaphore = Arc::new(Semaphore::new(self.config.jobs));
        let summary = Arc::new(Mutex::new(ScanSummary::default()));
        let matches = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(addresses.len());

        for (index, address) in addresses.into_iter().enumerate() {
            // Blocks while all slots are occupied.
            let permit = semaphore.clone().acquire_owned().await.unwrap();

            let probe = HostProbe::new(
                self.config.protocol,
                self.config.domain.clone(),
                self.config.timeout_duration(),
                self.baseline.clone(),
            );
            let summary = summary.clone();
            let matches = matches.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit; // Held for the probe's whole lifetime
                let task = ScanTask { index, address };
                let outcome = probe.run(&task).await;

                let mut summary = summary.lock().await;
                summary.completed += 1;

                match outcome {
                    Ok(Some(result)) => {
                        summary.matched += 1;
                        output::print_match(&result);
                        matches.lock().await.push(result);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        summary.errors += 1;
                        log::debug!("Probe {} failed: {}", task.address, e);
                    }
                }

                if summary.completed % PROGRESS_INTERVAL == 0 {
                    output::print_progress(summary.completed);
                }
            });

            handles.push(handle);
        }

        // Drain: the full barrier before the report is final.
        for join_result in futures::future::join_all(handles).await {
            if let Err(e) = join_result {
                log::error!("Probe task failed to complete: {}", e);
            }
        }

        let summary = summary.lock().await;
        report.matches = matches.lock().await.clone();
        report.finish(&summary, start.elapsed());

        Ok(report)
    }
}
