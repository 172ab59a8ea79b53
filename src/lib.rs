//! Erebus - the origin finder
//!
//! Discovers the real server hiding behind a CDN by probing candidate IP
//! addresses directly with a spoofed Host header and comparing response
//! fingerprints against a baseline captured from the public domain.

pub mod baseline;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod ranges;
pub mod scanner;

// Re-export commonly used types
pub use baseline::Baseline;
pub use config::{AddressSource, Protocol, ScanConfig};
pub use error::{Result, ScanError};
pub use fingerprint::{Fingerprint, MatchField};
pub use scanner::{MatchResult, ScanEngine, ScanReport};

/// User agent presented by every outbound request
pub const USER_AGENT: &str = concat!("erebus/", env!("CARGO_PKG_VERSION"));
