//! Address range enumeration
//!
//! Expands a CIDR block into the ordered list of candidate addresses the
//! scan engine walks. Expansion works uniformly for IPv4 and IPv6 by
//! treating the address bytes as a big-endian counter and incrementing
//! until the address leaves the block.
//!
//! The usable-host convention: an IPv4 block that expands to two or more
//! addresses has its network and broadcast entries dropped, so a /31 yields
//! nothing and a /32 yields the single address unchanged. IPv6 has no
//! broadcast address and IPv6 lists are returned whole.

pub mod registry;

use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{Result, ScanError};

/// Expand a CIDR block into an ordered list of candidate address strings.
///
/// Fails with `InvalidRange` if the specifier does not parse or if the block
/// would expand past `max_addresses`.
pub fn expand_cidr(cidr: &str, max_addresses: usize) -> Result<Vec<String>> {
    let network: IpNetwork = cidr
        .trim()
        .parse()
        .map_err(|e| ScanError::InvalidRange(format!("{}: {}", cidr.trim(), e)))?;

    check_block_size(&network, max_addresses)?;

    let mut addresses = Vec::new();
    let mut current = network.network();
    while network.contains(current) {
        addresses.push(current.to_string());
        match successor(current) {
            Some(next) => current = next,
            // Counter wrapped past the top of the address family.
            None => break,
        }
    }

    if network.is_ipv4() && addresses.len() >= 2 {
        // Drop the network and broadcast addresses.
        addresses.remove(0);
        addresses.pop();
    }

    Ok(addresses)
}

/// Expand a list of range specifiers, concatenating the results in order.
///
/// A specifier that fails to expand is skipped with a warning instead of
/// aborting the whole batch; registry documents occasionally carry records
/// the enumerator cannot consume.
pub fn expand_ranges<I>(specs: I, max_addresses: usize) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut addresses = Vec::new();

    for spec in specs {
        let spec = spec.as_ref();
        match expand_cidr(spec, max_addresses) {
            Ok(expanded) => addresses.extend(expanded),
            Err(e) => log::warn!("Skipping range {}: {}", spec, e),
        }
    }

    addresses
}

fn check_block_size(network: &IpNetwork, max_addresses: usize) -> Result<()> {
    let host_bits = match network {
        IpNetwork::V4(n) => 32 - n.prefix(),
        IpNetwork::V6(n) => 128 - n.prefix(),
    };

    // Anything with 64+ host bits is out of the question regardless of cap.
    let block_size = if host_bits >= 64 {
        u64::MAX
    } else {
        1u64 << host_bits
    };

    if block_size > max_addresses as u64 {
        return Err(ScanError::InvalidRange(format!(
            "{} expands to {} addresses (max: {})",
            network,
            if host_bits >= 64 {
                format!("2^{}", host_bits)
            } else {
                block_size.to_string()
            },
            max_addresses
        )));
    }

    Ok(())
}

/// Next address in ascending numeric order, big-endian over the byte
/// representation. Returns `None` when the counter wraps.
fn successor(addr: IpAddr) -> Option<IpAddr> {
    match addr {
        IpAddr::V4(v4) => {
            let value = u32::from(v4).checked_add(1)?;
            Some(IpAddr::V4(Ipv4Addr::from(value)))
        }
        IpAddr::V6(v6) => {
            let value = u128::from(v6).checked_add(1)?;
            Some(IpAddr::V6(Ipv6Addr::from(value)))
        }
    }
}
