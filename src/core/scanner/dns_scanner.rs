// src/core/scanner/dns_scanner.rs

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, info, warn};

/// Resolves the A records of a domain through the system resolver.
///
/// A failed or empty resolution is terminal for a scan, so unlike the
/// other lookups in this module the error is propagated to the caller.
pub async fn resolve_a(domain: &str) -> Result<Vec<Ipv4Addr>, String> {
    debug!(domain, "Resolving A records.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    match resolver.ipv4_lookup(domain).await {
        Ok(lookup) => {
            let ips: Vec<Ipv4Addr> = lookup.iter().map(|a| a.0).collect();
            info!(domain, count = ips.len(), "A record resolution complete.");
            Ok(ips)
        }
        Err(e) => {
            warn!(domain, error = %e, "A record resolution failed.");
            Err(format!("DNS Error: {}", e))
        }
    }
}

/// Reverse-resolves an IP to its PTR hostnames. Best-effort: a failed
/// lookup yields an empty list, since hostname-based classification is
/// purely opportunistic.
pub async fn reverse_lookup(ip: Ipv4Addr) -> Vec<String> {
    debug!(%ip, "Performing reverse lookup.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    match resolver.reverse_lookup(IpAddr::V4(ip)).await {
        Ok(lookup) => {
            let hostnames: Vec<String> = lookup
                .iter()
                .map(|ptr| ptr.0.to_utf8().trim_end_matches('.').to_string())
                .collect();
            debug!(%ip, count = hostnames.len(), "Reverse lookup complete.");
            hostnames
        }
        Err(e) => {
            debug!(%ip, error = %e, "Reverse lookup failed.");
            Vec::new()
        }
    }
}

/// Resolves a hostname through the fixed alternate resolver pair
/// (Google public DNS, 8.8.8.8 / 8.8.4.4) instead of the system
/// resolver. Used only by proxy-routed probes for their own DNS needs;
/// inputs that are already IP literals short-circuit.
pub async fn resolve_via_alternate(host: &str) -> Option<Ipv4Addr> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Some(ip);
    }

    debug!(host, "Resolving through alternate resolver pair.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::google(), ResolverOpts::default());

    match resolver.ipv4_lookup(host).await {
        Ok(lookup) => lookup.iter().next().map(|a| a.0),
        Err(e) => {
            warn!(host, error = %e, "Alternate resolution failed.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alternate_resolution_short_circuits_ip_literals() {
        // An IP literal never touches the network.
        let ip = resolve_via_alternate("203.0.113.7").await;
        assert_eq!(ip, Some(Ipv4Addr::new(203, 0, 113, 7)));
    }
}
