// src/core/scanner/mod.rs

// Public interface of the `scanner` module: one file per concern plus
// the orchestration that fans the concerns out and assembles the report.
pub mod cdn_scanner;
pub mod dns_scanner;
pub mod hosting_scanner;
pub mod http_scanner;
pub mod payload_scanner;
pub mod port_scanner;
pub mod ssl_scanner;

use crate::core::models::{ClassificationResult, DomainReport, IpReport, ScanError};
use crate::core::validator;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Runs a complete reconnaissance scan and assembles the report.
///
/// The domain is validated syntactically, then resolved; a failed or
/// empty resolution is terminal and nothing else runs. All domain-level
/// checks (HTTP status, ports, certificate, TLS posture) execute in
/// parallel with `tokio::join!`, and every resolved IP is then
/// classified and probed concurrently. No failure past resolution aborts
/// the scan; failed pieces surface as absent or negative values in the
/// report.
pub async fn run_full_scan(domain: &str) -> Result<DomainReport, ScanError> {
    if !validator::is_valid_domain(domain) {
        return Err(ScanError::InvalidDomain(domain.to_string()));
    }

    info!(domain, "Starting full scan.");
    let resolved_ips = dns_scanner::resolve_a(domain)
        .await
        .map_err(|_| ScanError::Resolution(domain.to_string()))?;
    if resolved_ips.is_empty() {
        return Err(ScanError::Resolution(domain.to_string()));
    }

    let (http_status, certificate, security, http_open, https_open) = tokio::join!(
        http_scanner::check_http_status(domain),
        ssl_scanner::inspect_certificate(domain, true),
        ssl_scanner::assess_security(domain),
        port_scanner::probe_port(domain, 80, port_scanner::PORT_PROBE_TIMEOUT),
        port_scanner::probe_port(domain, 443, port_scanner::PORT_PROBE_TIMEOUT),
    );

    let mut ports = BTreeMap::new();
    ports.insert(80, http_open);
    ports.insert(443, https_open);

    let mut set = JoinSet::new();
    for &ip in &resolved_ips {
        let domain = domain.to_string();
        set.spawn(async move { scan_ip(&domain, ip).await });
    }

    let mut ip_reports = Vec::with_capacity(resolved_ips.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => ip_reports.push(report),
            Err(e) => warn!(error = %e, "Per-IP scan task failed to join."),
        }
    }
    // JoinSet completion order is arbitrary; keep the report in
    // resolution order.
    ip_reports.sort_by_key(|r| resolved_ips.iter().position(|ip| *ip == r.ip));

    info!(domain, ips = resolved_ips.len(), "Full scan complete.");
    Ok(DomainReport {
        domain: domain.to_string(),
        resolved_ips,
        http_status,
        ports,
        certificate,
        security,
        ip_reports,
    })
}

/// Classifies, geolocates and probes a single resolved address. The
/// four lookups are independent and run in parallel.
async fn scan_ip(domain: &str, ip: Ipv4Addr) -> IpReport {
    info!(domain, %ip, "Scanning resolved address.");
    let (cdn, hosting, geo, probes) = tokio::join!(
        cdn_scanner::classify_cdn(ip),
        hosting_scanner::classify_hosting(ip),
        hosting_scanner::lookup_geo(ip),
        payload_scanner::run_probe_battery(domain, ip),
    );

    IpReport {
        ip,
        classification: ClassificationResult { cdn, hosting },
        probes,
        geo,
    }
}
