// src/core/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

/// Terminal scan failures. Everything else in a scan is contained locally
/// and represented as an absent or negative value in the report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("'{0}' is not a valid domain name")]
    InvalidDomain(String),
    #[error("could not resolve domain '{0}'")]
    Resolution(String),
}

// --- Probe Engine Models ---

/// The carrier/technique family a payload belongs to. Family membership is
/// a tag on the spec, never derived from the probe's display name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProbeFamily {
    Vivo,
    Tim,
    Split,
    General,
}

/// The recorded outcome of a single payload probe. `status == 0` means no
/// HTTP response ever arrived (transport error or deadline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub family: ProbeFamily,
    pub status: u16,
    pub success: bool,
    pub headers: HashMap<String, String>,
    pub error: Option<String>,
}

// --- TLS Inspector Models ---

/// Certificate metadata read from an observational TLS handshake.
/// Validity dates are calendar dates, locale-independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub issuer_org: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub subject_common_name: Option<String>,
    pub subject_alt_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SecurityLevel {
    High,
    Medium,
    Low,
    Unavailable,
}

/// Negotiated-protocol posture of the target's TLS endpoint.
/// `level` is derived deterministically from the three booleans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAssessment {
    pub tls_version: Option<String>,
    pub has_modern_tls: bool,
    pub has_strong_cipher: bool,
    pub has_forward_secrecy: bool,
    pub level: SecurityLevel,
}

impl Default for SecurityAssessment {
    fn default() -> Self {
        Self {
            tls_version: None,
            has_modern_tls: false,
            has_strong_cipher: false,
            has_forward_secrecy: false,
            level: SecurityLevel::Unavailable,
        }
    }
}

// --- Classifier Models ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HostingKind {
    VpsCloud,
    Datacenter,
    DedicatedOther,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingInfo {
    pub provider: String,
    pub kind: HostingKind,
}

/// Combined infrastructure classification for one resolved IP.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassificationResult {
    pub cdn: Option<String>,
    pub hosting: Option<HostingInfo>,
}

/// Geolocation snippet passed through from the external IP lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoInfo {
    pub city: String,
    pub country: String,
    pub isp: String,
    pub region: String,
}

// --- Reachability Models ---

/// Which scheme answered first and with what status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStatusInfo {
    pub protocol: String,
    pub status: u16,
}

// --- Main Report ---

/// Everything the engine learned about a single resolved address:
/// classification, geolocation and the full payload battery, keyed by
/// probe name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpReport {
    pub ip: Ipv4Addr,
    pub classification: ClassificationResult,
    pub probes: HashMap<String, ProbeResult>,
    pub geo: Option<GeoInfo>,
}

/// The aggregate scan report. Built once per scan and immutable after
/// assembly; `resolved_ips` is never empty (an empty resolution is a
/// terminal `ScanError::Resolution` instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: String,
    pub resolved_ips: Vec<Ipv4Addr>,
    pub http_status: Option<HttpStatusInfo>,
    pub ports: BTreeMap<u16, bool>,
    pub certificate: Option<CertificateInfo>,
    pub security: SecurityAssessment,
    pub ip_reports: Vec<IpReport>,
}
