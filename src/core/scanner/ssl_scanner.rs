// src/core/scanner/ssl_scanner.rs

use crate::core::models::{CertificateInfo, SecurityAssessment, SecurityLevel};
use chrono::DateTime;
use native_tls::TlsConnector;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tokio::time::timeout;
use tokio_rustls::rustls;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

/// Deadline applied to every TLS-facing network call in this module.
const TLS_TIMEOUT: Duration = Duration::from_secs(5);

// --- Certificate inspection (native-tls, blocking) ---

/// Opens an observational TLS connection on port 443 and extracts
/// certificate metadata. Certificate validation is disabled: this reads
/// what the peer presents, it does not make a trust decision. When
/// `use_sni` is false the ClientHello carries no server name, which can
/// surface a different (default) certificate; SAN and subject CN are
/// only read on the SNI-specific pass.
///
/// Connection or parse failures yield `None`, never an error.
pub async fn inspect_certificate(domain: &str, use_sni: bool) -> Option<CertificateInfo> {
    info!(domain, use_sni, "Inspecting TLS certificate.");
    let target = domain.to_string();

    debug!("Spawning blocking task for TLS handshake.");
    spawn_blocking(move || perform_certificate_read(&target, use_sni))
        .await
        .unwrap_or_else(|e| {
            error!(panic = %e, "Blocking certificate inspection task panicked!");
            None
        })
}

fn perform_certificate_read(domain: &str, use_sni: bool) -> Option<CertificateInfo> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .use_sni(use_sni)
        .build()
        .map_err(|e| error!(error = %e, "Failed to create TlsConnector"))
        .ok()?;

    let addr = (domain, 443u16)
        .to_socket_addrs()
        .map_err(|e| debug!(domain, error = %e, "Address resolution failed"))
        .ok()?
        .next()?;

    debug!(domain, %addr, "Connecting TCP stream to port 443.");
    let stream = TcpStream::connect_timeout(&addr, TLS_TIMEOUT)
        .map_err(|e| debug!(domain, error = %e, "TCP connection failed"))
        .ok()?;
    stream.set_read_timeout(Some(TLS_TIMEOUT)).ok()?;
    stream.set_write_timeout(Some(TLS_TIMEOUT)).ok()?;

    debug!(domain, "Performing TLS handshake.");
    let stream = connector
        .connect(domain, stream)
        .map_err(|e| debug!(domain, error = %e, "TLS handshake failed"))
        .ok()?;

    let cert = match stream.peer_certificate() {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!(domain, "TLS connection succeeded but no peer certificate was presented.");
            return None;
        }
        Err(e) => {
            warn!(domain, error = %e, "Failed to retrieve peer certificate from stream");
            return None;
        }
    };

    let cert_der = cert
        .to_der()
        .map_err(|e| error!(error = %e, "Failed to convert certificate to DER format"))
        .ok()?;

    let (_, x509) = parse_x509_certificate(&cert_der)
        .map_err(|e| error!(error = %e, "Failed to parse X.509 certificate"))
        .ok()?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed peer certificate.");

    let issuer_org = x509
        .issuer()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or("N/A")
        .to_string();

    let validity = x509.validity();
    let valid_from = asn1_time_to_naive_date(&validity.not_before);
    let valid_to = asn1_time_to_naive_date(&validity.not_after);

    // Subject details are only meaningful on the SNI-specific pass, where
    // the server has had the chance to pick the certificate for this name.
    let (subject_common_name, subject_alt_names) = if use_sni {
        (extract_common_name(&x509), Some(extract_alt_names(&x509)))
    } else {
        (None, None)
    };

    Some(CertificateInfo {
        issuer_org,
        valid_from,
        valid_to,
        subject_common_name,
        subject_alt_names,
    })
}

fn asn1_time_to_naive_date(time: &ASN1Time) -> chrono::NaiveDate {
    DateTime::from_timestamp(time.timestamp(), 0)
        .unwrap_or_default()
        .date_naive()
}

fn extract_common_name(x509: &X509Certificate) -> Option<String> {
    x509.subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(String::from)
}

/// Collects Subject Alternative Name entries as bare strings (no
/// `DNS:` / `IP Address:` prefixes, those are an artifact of textual
/// certificate dumps).
fn extract_alt_names(x509: &X509Certificate) -> Vec<String> {
    let mut sans = Vec::new();
    for ext in x509.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(dns) => sans.push(dns.to_string()),
                    GeneralName::IPAddress(ip) => {
                        if ip.len() == 4 {
                            let arr: [u8; 4] = [ip[0], ip[1], ip[2], ip[3]];
                            sans.push(std::net::IpAddr::from(arr).to_string());
                        } else if ip.len() == 16 {
                            let mut arr = [0u8; 16];
                            arr.copy_from_slice(ip);
                            sans.push(std::net::IpAddr::from(arr).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    sans
}

// --- Security assessment (tokio-rustls) ---

/// A verifier that accepts any certificate. Every connection in this
/// engine is observational, so the handshake must succeed even against
/// self-signed or mismatched certificates.
struct NoVerification;

impl rustls::client::ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

/// Builds the shared non-validating TLS connector used by the security
/// assessment and by direct payload probes.
pub(crate) fn insecure_tls_connector() -> tokio_rustls::TlsConnector {
    let config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(NoVerification))
        .with_no_client_auth();
    tokio_rustls::TlsConnector::from(Arc::new(config))
}

/// Performs a TLS handshake on port 443 and scores the negotiated
/// protocol version and cipher suite. A failed handshake yields the
/// `Unavailable` assessment with all three booleans false.
pub async fn assess_security(domain: &str) -> SecurityAssessment {
    info!(domain, "Assessing TLS security posture.");
    match timeout(TLS_TIMEOUT, negotiate(domain)).await {
        Ok(Some(assessment)) => assessment,
        Ok(None) => {
            debug!(domain, "TLS negotiation failed, security level unavailable.");
            SecurityAssessment::default()
        }
        Err(_) => {
            debug!(domain, "TLS negotiation timed out, security level unavailable.");
            SecurityAssessment::default()
        }
    }
}

async fn negotiate(domain: &str) -> Option<SecurityAssessment> {
    let server_name = rustls::ServerName::try_from(domain)
        .map_err(|e| debug!(domain, error = %e, "Invalid server name"))
        .ok()?;

    let tcp = tokio::net::TcpStream::connect((domain, 443u16))
        .await
        .map_err(|e| debug!(domain, error = %e, "TCP connection failed"))
        .ok()?;

    let stream = insecure_tls_connector()
        .connect(server_name, tcp)
        .await
        .map_err(|e| debug!(domain, error = %e, "TLS handshake failed"))
        .ok()?;

    let (_, conn) = stream.get_ref();

    let tls_version = conn.protocol_version().map(|v| match v {
        rustls::ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        rustls::ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        other => format!("{:?}", other),
    });

    let has_modern_tls = matches!(
        conn.protocol_version(),
        Some(rustls::ProtocolVersion::TLSv1_2) | Some(rustls::ProtocolVersion::TLSv1_3)
    );

    // The cipher indicators are substring checks on the suite name, kept
    // deliberately simple: "AES" marks a strong cipher, "ECDHE" marks an
    // ephemeral key exchange. TLS 1.3 suite names omit the key exchange,
    // so forward secrecy is only attributed to 1.2 ECDHE suites here.
    let cipher_name = conn
        .negotiated_cipher_suite()
        .map(|suite| format!("{:?}", suite.suite()))
        .unwrap_or_default();
    let has_strong_cipher = cipher_name.contains("AES");
    let has_forward_secrecy = cipher_name.contains("ECDHE");

    info!(domain, ?tls_version, cipher = %cipher_name, "TLS negotiation complete.");

    Some(SecurityAssessment {
        tls_version,
        has_modern_tls,
        has_strong_cipher,
        has_forward_secrecy,
        level: derive_security_level(true, has_modern_tls, has_strong_cipher, has_forward_secrecy),
    })
}

/// Pure derivation of the security level, evaluated in this exact
/// precedence:
/// - modern TLS with both a strong cipher and forward secrecy → High
/// - modern TLS with either one → Medium
/// - any completed handshake otherwise → Low
/// - no handshake at all → Unavailable
pub fn derive_security_level(
    handshake_ok: bool,
    modern: bool,
    strong_cipher: bool,
    forward_secrecy: bool,
) -> SecurityLevel {
    if !handshake_ok {
        SecurityLevel::Unavailable
    } else if modern && strong_cipher && forward_secrecy {
        SecurityLevel::High
    } else if modern && (strong_cipher || forward_secrecy) {
        SecurityLevel::Medium
    } else {
        SecurityLevel::Low
    }
}
