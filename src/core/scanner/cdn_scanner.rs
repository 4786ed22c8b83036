// src/core/scanner/cdn_scanner.rs

use crate::core::knowledge_base::{CDN_HOSTNAME_RULES, match_signature};
use crate::core::scanner::dns_scanner;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The published IPv4 range list of the one CDN whose network blocks are
/// public. Fetched fresh on every classification call by design; callers
/// needing throughput should cache outside this module.
const CLOUDFLARE_RANGES_URL: &str = "https://www.cloudflare.com/ips-v4";

/// Tests whether `ip` falls inside any published Cloudflare CIDR block.
/// A failed fetch is treated as "not in range", never as an error.
pub async fn is_known_cdn_range(ip: Ipv4Addr) -> bool {
    debug!(%ip, "Fetching published CDN ranges.");
    let ranges = match fetch_range_list().await {
        Ok(r) => r,
        Err(e) => {
            warn!(%ip, error = %e, "CDN range fetch failed.");
            return false;
        }
    };

    ranges.iter().any(|block| cidr_contains(block, ip))
}

async fn fetch_range_list() -> Result<Vec<String>, String> {
    let client = reqwest::Client::builder()
        .user_agent("tunnelprobe/0.1")
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let body = client
        .get(CLOUDFLARE_RANGES_URL)
        .send()
        .await
        .map_err(|e| format!("Range list request failed: {}", e))?
        .text()
        .await
        .map_err(|e| format!("Range list body unreadable: {}", e))?;

    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Standard prefix-mask membership test. Network and candidate are packed
/// into 32-bit integers; membership holds iff `(ip & mask) == (network &
/// mask)`. `/0` matches everything and `/32` matches exactly one address;
/// both avoid the undefined 32-bit shift.
pub fn cidr_contains(block: &str, ip: Ipv4Addr) -> bool {
    let Some((network, bits)) = block.split_once('/') else {
        return false;
    };
    let Ok(network) = network.parse::<Ipv4Addr>() else {
        return false;
    };
    let Ok(bits) = bits.parse::<u8>() else {
        return false;
    };
    if bits > 32 {
        return false;
    }

    let mask: u32 = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

/// Reverse-resolves `ip` and tests each hostname against the fixed CDN
/// signature table. Returns the first matching operator's canonical name.
pub async fn match_cdn_by_hostname(ip: Ipv4Addr) -> Option<String> {
    let hostnames = dns_scanner::reverse_lookup(ip).await;

    for hostname in &hostnames {
        if let Some(name) = match_signature(CDN_HOSTNAME_RULES, hostname) {
            debug!(%ip, hostname, cdn = name, "Reverse-DNS CDN signature matched.");
            return Some(name.to_string());
        }
    }
    None
}

/// Combined CDN classification. The CIDR-range membership test takes
/// priority over hostname signatures; `None` means no CDN was detected.
pub async fn classify_cdn(ip: Ipv4Addr) -> Option<String> {
    if is_known_cdn_range(ip).await {
        info!(%ip, "Address is inside a published Cloudflare range.");
        return Some("Cloudflare".to_string());
    }
    let matched = match_cdn_by_hostname(ip).await;
    if let Some(cdn) = &matched {
        info!(%ip, cdn, "CDN detected via reverse DNS.");
    }
    matched
}
