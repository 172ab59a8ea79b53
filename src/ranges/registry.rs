//! Published address-range registry provider
//!
//! Fetches a JSON registry document (the AWS `ip-ranges.json` layout), picks
//! the prefix records tagged with the requested region, and hands the
//! surviving CIDR blocks to the enumerator. Parsing is split from fetching
//! so the filter logic is testable without a network.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, ScanError};

/// One IPv4 prefix record from the registry document
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixRecord {
    pub ip_prefix: String,
    pub region: String,
}

/// One IPv6 prefix record. Parsed for completeness; the enumerator only
/// consumes IPv4 prefixes.
#[derive(Debug, Clone, Deserialize)]
pub struct Ipv6PrefixRecord {
    pub ipv6_prefix: String,
    pub region: String,
}

/// Parsed registry document
#[derive(Debug, Deserialize)]
pub struct RangeRegistry {
    #[serde(rename = "syncToken", default)]
    pub sync_token: String,

    #[serde(rename = "createDate", default)]
    pub create_date: String,

    pub prefixes: Vec<PrefixRecord>,

    #[serde(default)]
    pub ipv6_prefixes: Vec<Ipv6PrefixRecord>,
}

impl RangeRegistry {
    /// CIDR blocks whose region tag equals the requested selection
    pub fn prefixes_for(&self, region: &str) -> Vec<String> {
        self.prefixes
            .iter()
            .filter(|record| record.region == region)
            .map(|record| record.ip_prefix.clone())
            .collect()
    }
}

/// Parse a registry document. A document that is not valid JSON in the
/// expected layout is fatal; individual records are validated later, when
/// the enumerator expands them.
pub fn parse_registry(body: &str) -> Result<RangeRegistry> {
    serde_json::from_str(body)
        .map_err(|e| ScanError::Registry(format!("Malformed registry document: {}", e)))
}

/// Fetch and parse the registry document over HTTPS
pub async fn fetch_registry(url: &str, timeout: Duration) -> Result<RangeRegistry> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(crate::USER_AGENT)
        .build()?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::Registry(format!(
            "Registry fetch returned status {}",
            status
        )));
    }

    let body = response.text().await?;
    let registry = parse_registry(&body)?;

    log::debug!(
        "Registry sync token {} created {} ({} IPv4 prefixes, {} IPv6 prefixes)",
        registry.sync_token,
        registry.create_date,
        registry.prefixes.len(),
        registry.ipv6_prefixes.len()
    );

    Ok(registry)
}

/// Resolve a region tag to candidate addresses: fetch the registry, filter
/// by tag, expand every matching prefix, concatenate in document order.
pub async fn region_addresses(
    url: &str,
    region: &str,
    max_addresses: usize,
    timeout: Duration,
) -> Result<Vec<String>> {
    let registry = fetch_registry(url, timeout).await?;
    let prefixes = registry.prefixes_for(region);

    if prefixes.is_empty() {
        return Err(ScanError::Registry(format!(
            "No prefixes tagged with region {}",
            region
        )));
    }

    log::info!("Region {} matched {} prefixes", region, prefixes.len());

    Ok(super::expand_ranges(prefixes, max_addresses))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "syncToken": "1693526400",
        "createDate": "2023-09-01-00-00-00",
        "prefixes": [
            { "ip_prefix": "10.10.0.0/30", "region": "eu-west-1", "service": "EC2" },
            { "ip_prefix": "10.20.0.0/30", "region": "us-east-1", "service": "EC2" },
            { "ip_prefix": "10.30.0.0/30", "region": "eu-west-1", "service": "S3" }
        ],
        "ipv6_prefixes": [
            { "ipv6_prefix": "2600:1f18::/33", "region": "eu-west-1", "service": "EC2" }
        ]
    }"#;

    #[test]
    fn test_parse_registry_document() {
        let registry = parse_registry(DOCUMENT).unwrap();
        assert_eq!(registry.sync_token, "1693526400");
        assert_eq!(registry.prefixes.len(), 3);
        assert_eq!(registry.ipv6_prefixes.len(), 1);
    }

    #[test]
    fn test_filter_by_region_tag() {
        let registry = parse_registry(DOCUMENT).unwrap();
        let prefixes = registry.prefixes_for("eu-west-1");
        assert_eq!(prefixes, vec!["10.10.0.0/30".to_string(), "10.30.0.0/30".to_string()]);

        assert!(registry.prefixes_for("ap-south-1").is_empty());
    }

    #[test]
    fn test_ipv6_prefixes_are_not_consumed() {
        // Only IPv4 prefix records feed the enumerator.
        let registry = parse_registry(DOCUMENT).unwrap();
        let addresses = crate::ranges::expand_ranges(registry.prefixes_for("eu-west-1"), 65536);
        assert!(addresses.iter().all(|a| a.parse::<std::net::Ipv4Addr>().is_ok()));
        assert_eq!(addresses.len(), 4);
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        assert!(matches!(
            parse_registry("{ not json"),
            Err(ScanError::Registry(_))
        ));
        assert!(matches!(
            parse_registry(r#"{"prefixes": "nope"}"#),
            Err(ScanError::Registry(_))
        ));
    }

    #[test]
    fn test_malformed_record_is_skipped_on_expansion() {
        let registry = parse_registry(
            r#"{
                "prefixes": [
                    { "ip_prefix": "10.10.0.0/30", "region": "eu-west-1" },
                    { "ip_prefix": "garbage", "region": "eu-west-1" }
                ]
            }"#,
        )
        .unwrap();

        let addresses = crate::ranges::expand_ranges(registry.prefixes_for("eu-west-1"), 65536);
        assert_eq!(addresses, vec!["10.10.0.1".to_string(), "10.10.0.2".to_string()]);
    }
}
