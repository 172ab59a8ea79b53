//! Configuration module for the erebus scanner

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default registry document carrying published address ranges (AWS layout).
pub const DEFAULT_REGISTRY_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Protocol used both for the baseline fetch and for candidate probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// URL scheme string for request construction
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(format!("Unknown protocol: {} (expected http or https)", s)),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Where candidate addresses come from: a literal CIDR block, or a region
/// tag resolved through the range registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSource {
    Cidr(String),
    Region(String),
}

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Target domain whose origin server is being hunted
    pub domain: String,

    /// Protocol the site answers on behind the CDN
    pub protocol: Protocol,

    /// Candidate address source
    pub source: AddressSource,

    /// Maximum number of probes in flight at any instant
    pub jobs: usize,

    /// Timeout for each probe request in milliseconds
    pub timeout: u64,

    /// Refuse to expand a block into more addresses than this
    pub max_addresses: usize,

    /// Range registry document URL (region source only)
    pub registry_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            protocol: Protocol::Http,
            source: AddressSource::Cidr("192.168.0.0/24".to_string()),
            jobs: 20,
            timeout: 3000,
            max_addresses: 65536,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

impl ScanConfig {
    /// Create a new scan configuration for a domain
    pub fn new(domain: String, source: AddressSource) -> Self {
        Self {
            domain,
            source,
            ..Default::default()
        }
    }

    /// Set the protocol
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the concurrency limit
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the per-probe timeout in milliseconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the expansion cap
    pub fn with_max_addresses(mut self, max_addresses: usize) -> Self {
        self.max_addresses = max_addresses;
        self
    }

    /// Set the registry document URL
    pub fn with_registry_url(mut self, url: String) -> Self {
        self.registry_url = url;
        self
    }

    /// Get the per-probe timeout as a Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Validate the configuration before any dispatch happens
    pub fn validate(&self) -> crate::Result<()> {
        if self.domain.trim().is_empty() {
            return Err(crate::ScanError::Config("Domain cannot be empty".to_string()));
        }

        if self.domain.contains(' ') || self.domain.contains("://") {
            return Err(crate::ScanError::Config(format!(
                "Invalid domain: {} (expected a bare hostname)",
                self.domain
            )));
        }

        if self.jobs == 0 {
            return Err(crate::ScanError::Config(
                "Concurrency limit must be greater than 0".to_string(),
            ));
        }

        if self.timeout == 0 {
            return Err(crate::ScanError::Config(
                "Probe timeout must be greater than 0".to_string(),
            ));
        }

        match &self.source {
            AddressSource::Cidr(cidr) if cidr.trim().is_empty() => {
                Err(crate::ScanError::Config("CIDR block cannot be empty".to_string()))
            }
            AddressSource::Region(region) if region.trim().is_empty() => {
                Err(crate::ScanError::Config("Region tag cannot be empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Optional defaults loaded from a TOML config file. Every field is optional;
/// anything present overrides the built-in default but not an explicit flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub protocol: Option<Protocol>,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub max_addresses: Option<usize>,
    pub registry_url: Option<String>,
}

impl FileConfig {
    /// Load configuration defaults from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::ScanError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| crate::ScanError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration defaults from ~/.erebus.toml if present
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".erebus.toml");

        if config_path.exists() {
            if let Ok(config) = Self::from_toml_file(&config_path) {
                log::info!("Loaded config defaults from {}", config_path.display());
                return config;
            }
        }

        Self::default()
    }

    /// Apply these file-level defaults onto a config
    pub fn apply(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(max_addresses) = self.max_addresses {
            config.max_addresses = max_addresses;
        }
        if let Some(ref url) = self.registry_url {
            config.registry_url = url.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
        assert!("gopher".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_domain() {
        let config = ScanConfig {
            domain: "".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_url_domain() {
        let config = ScanConfig {
            domain: "https://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let config = ScanConfig::default().with_jobs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_source() {
        let config = ScanConfig::new(
            "example.com".to_string(),
            AddressSource::Region("  ".to_string()),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_file_config_overlay() {
        let file = FileConfig {
            jobs: Some(50),
            timeout: None,
            ..Default::default()
        };
        let config = file.apply(ScanConfig::default());
        assert_eq!(config.jobs, 50);
        assert_eq!(config.timeout, 3000);
    }

    #[test]
    fn test_file_config_parses_toml() {
        let file: FileConfig = toml::from_str("jobs = 64\nprotocol = \"https\"").unwrap();
        assert_eq!(file.jobs, Some(64));
        assert_eq!(file.protocol, Some(Protocol::Https));
    }
}
