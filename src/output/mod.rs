//! Output formatting and console reporting

use colored::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};

use crate::scanner::{MatchResult, ScanReport};

/// Output format options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
        }
    }
}

/// Writes the final report to stdout or a file
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write the scan report in the configured format
    pub fn write_report(&self, report: &ScanReport) -> io::Result<()> {
        let output = match self.config.format {
            OutputFormat::Text => format_text(report),
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
        };

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                println!("{}", output);
            }
        }

        Ok(())
    }
}

/// Format the report as plain text
fn format_text(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Scanned {} hosts for {} over {} in {:.1}s ({} probe errors)\n",
        report.scanned,
        report.domain,
        report.protocol,
        report.duration().as_secs_f64(),
        report.errors,
    ));

    if report.matches.is_empty() {
        output.push_str("No origin candidates matched the baseline.\n");
    } else {
        output.push_str(&format!("{} origin candidate(s):\n", report.matches.len()));
        for m in &report.matches {
            output.push_str(&format!(
                "  {} status={} matched={}\n",
                m.address, m.status, m.field
            ));
        }
    }

    output
}

/// Multi-line block for a match, printed the moment the probe reports it
pub fn print_match(result: &MatchResult) {
    println!("{}", "##############-HOST FOUND-###################".bright_green().bold());
    println!("{} {}", "Server IP:".bright_green(), result.address.bright_green().bold());
    println!("{} {}", "HTTP Status:".bright_green(), result.status.to_string().bright_green());
    match result.field {
        crate::fingerprint::MatchField::BodyLength => {
            println!(
                "{} {} bytes",
                "Matched body length:".bright_green(),
                result.body_len.to_string().bright_green()
            );
        }
        _ => {
            println!(
                "{} {}",
                "Matched title:".bright_green(),
                result.title.as_deref().unwrap_or("").bright_green()
            );
        }
    }
    println!("{}", "#############################################".bright_green().bold());
}

/// Progress milestone line, count only
pub fn print_progress(completed: usize) {
    println!("{} {} {}", "[~]".bright_cyan(), "Scanned".bright_cyan(), format!("{} hosts", completed).bright_cyan().bold());
}

/// Cyan status line used for pre-scan reporting
pub fn print_status(label: &str, value: &str) {
    println!("{} {} {}", "[~]".bright_cyan(), label.bright_cyan(), value.bright_cyan().bold());
}

/// Final one-line summary after the drain completes
pub fn print_summary(report: &ScanReport) {
    println!();
    if report.matches.is_empty() {
        println!(
            "{} {}",
            "[~]".bright_cyan(),
            format!(
                "Scan complete: {} hosts probed in {:.1}s, no origin found",
                report.scanned,
                report.duration().as_secs_f64()
            )
            .bright_cyan()
        );
    } else {
        println!(
            "{} {}",
            "[+]".bright_green(),
            format!(
                "Scan complete: {} hosts probed in {:.1}s, {} origin candidate(s) found",
                report.scanned,
                report.duration().as_secs_f64(),
                report.matches.len()
            )
            .bright_green()
            .bold()
        );
    }
}
