// src/core/scanner/payload_scanner.rs

//! The payload probe engine. A fixed catalog of crafted HTTP/TLS
//! requests is fired at the target, each one a bounded, isolated probe
//! of a single proxy/tunnel technique. The catalog is pure data: adding
//! a payload means adding a table entry, never a code branch.

use crate::core::models::{ProbeFamily, ProbeResult};
use crate::core::scanner::dns_scanner;
use crate::core::scanner::ssl_scanner::insecure_tls_connector;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_rustls::rustls;
use tracing::{debug, info, warn};

/// Single deadline for the whole exchange of one probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status codes that mark a probe as tolerated by the endpoint.
pub const SUCCESS_CODES: [u16; 3] = [100, 101, 200];

/// Response head larger than this is treated as garbage.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// An immutable payload template. `{host}` in the path or header values
/// is substituted with the target domain at build time; the `Host`
/// header is always forced to the literal domain regardless of the
/// template (so the catalog's own `Host` entries are placeholders).
pub struct ProbeSpec {
    pub name: &'static str,
    pub family: ProbeFamily,
    pub method: &'static str,
    pub path: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

impl ProbeSpec {
    /// Proxy-routed specs connect to the proxy IP instead of the domain
    /// and carry an absolute URI in the request line.
    pub fn uses_proxy_routing(&self) -> bool {
        self.family == ProbeFamily::Split
    }
}

/// The fixed payload catalog: 15 probes across 4 technique families,
/// named after the carrier/bypass trick each one emulates.
pub static CATALOG: &[ProbeSpec] = &[
    // --- Vivo ---
    ProbeSpec {
        name: "Vivo WSS",
        family: ProbeFamily::Vivo,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Upgrade", "websocket"),
            ("Connection", "Upgrade"),
            ("Sec-WebSocket-Key", "SGVsbG8sIHdvcmxkIQ=="),
        ],
    },
    ProbeSpec {
        name: "Vivo Direct",
        family: ProbeFamily::Vivo,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Connection", "Upgrade"),
            ("Upgrade", "Websocket"),
            ("X-Real-IP", "127.0.0.1"),
            ("User-Agent", "Upgrade"),
        ],
    },
    ProbeSpec {
        name: "Vivo Proxy",
        family: ProbeFamily::Vivo,
        method: "GET",
        path: "http://{host}/",
        headers: &[
            ("Host", "{host}"),
            ("X-Online-Host", "{host}"),
            ("X-Forward-Host", "{host}"),
            ("Connection", "Keep-Alive"),
        ],
    },
    ProbeSpec {
        name: "Vivo Continue",
        family: ProbeFamily::Vivo,
        method: "POST",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Expect", "100-continue"),
            ("Content-Length", "1024"),
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Connection", "Keep-Alive"),
            ("X-Online-Host", "{host}"),
            ("X-Forward-Host", "{host}"),
            ("X-Forwarded-For", "127.0.0.1"),
            ("User-Agent", "Googlebot/2.1"),
            ("Accept", "*/*"),
            ("Accept-Encoding", "gzip, deflate"),
            ("Cache-Control", "no-cache"),
        ],
    },
    // --- TIM ---
    ProbeSpec {
        name: "TIM Direct",
        family: ProbeFamily::Tim,
        method: "CONNECT",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("X-Online-Host", "{host}"),
            ("Connection", "Keep-Alive"),
        ],
    },
    ProbeSpec {
        name: "TIM Proxy",
        family: ProbeFamily::Tim,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("X-Real-IP", "127.0.0.1"),
            ("Connection", "Keep-Alive"),
            ("Proxy-Connection", "Keep-Alive"),
        ],
    },
    ProbeSpec {
        name: "TIM Upgrade",
        family: ProbeFamily::Tim,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Upgrade", "websocket"),
            ("Connection", "Upgrade"),
            ("Sec-WebSocket-Protocol", "TIM"),
        ],
    },
    ProbeSpec {
        name: "TIM Continue",
        family: ProbeFamily::Tim,
        method: "POST",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Expect", "100-continue"),
            ("Content-Length", "1024"),
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Connection", "Keep-Alive"),
            ("X-Online-Host", "{host}"),
            ("Proxy-Connection", "Keep-Alive"),
            ("X-Forward-Host", "{host}"),
            ("X-Forwarded-For", "127.0.0.1"),
            ("User-Agent", "Googlebot/2.1"),
            ("Accept", "*/*"),
            ("Accept-Encoding", "gzip, deflate"),
            ("Cache-Control", "no-cache"),
            ("X-T-Forward-For", "127.0.0.1"),
            ("X-Real-Host", "{host}"),
        ],
    },
    // --- Split (proxy-routed) ---
    ProbeSpec {
        name: "Split ACL",
        family: ProbeFamily::Split,
        method: "ACL",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Expect", "100-continue"),
            ("Connection", "Upgrade"),
            ("Proxy-Connection", "Keep-Alive"),
            ("Upgrade", "websocket"),
            ("X-Forward-Protocol", "https"),
            ("X-Forwarded-For", "127.0.0.1"),
            ("User-Agent", "Googlebot/2.1"),
        ],
    },
    ProbeSpec {
        name: "Split Direct",
        family: ProbeFamily::Split,
        method: "CONNECT",
        path: "/{host}:443",
        headers: &[
            ("Host", "{host}"),
            ("Connection", "Keep-Alive"),
            ("Proxy-Connection", "Keep-Alive"),
            ("X-Online-Host", "{host}"),
        ],
    },
    // --- General ---
    ProbeSpec {
        name: "CONNECT Direct",
        family: ProbeFamily::General,
        method: "CONNECT",
        path: "{host}:443",
        headers: &[
            ("Host", "{host}"),
            ("X-Online-Host", "{host}"),
            ("Connection", "Keep-Alive"),
            ("Proxy-Connection", "Keep-Alive"),
        ],
    },
    ProbeSpec {
        name: "SSL + Upgrade",
        family: ProbeFamily::General,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Upgrade", "websocket"),
            ("Connection", "Upgrade,Keep-Alive"),
            ("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="),
            ("Sec-WebSocket-Version", "13"),
            ("Sec-WebSocket-Protocol", "chat"),
        ],
    },
    ProbeSpec {
        name: "Real Host",
        family: ProbeFamily::General,
        method: "GET",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("X-Real-IP", "127.0.0.1"),
            ("X-Forwarded-For", "127.0.0.1"),
            ("Connection", "Keep-Alive"),
            ("Proxy-Connection", "Keep-Alive"),
        ],
    },
    ProbeSpec {
        name: "Continue Test",
        family: ProbeFamily::General,
        method: "POST",
        path: "/",
        headers: &[
            ("Host", "{host}"),
            ("Expect", "100-continue"),
            ("Content-Length", "1024"),
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Connection", "Keep-Alive"),
        ],
    },
    // Unmodified control request; the battery always carries one plain
    // GET so tolerated techniques can be read against a baseline.
    ProbeSpec {
        name: "Direct GET",
        family: ProbeFamily::General,
        method: "GET",
        path: "/",
        headers: &[("Host", "{host}"), ("Connection", "Keep-Alive")],
    },
];

/// Where a probe's TCP connection actually goes.
pub(crate) enum ProbeTarget {
    /// TLS to `domain:port` (the request path is used as-is).
    Direct { port: u16 },
    /// Plain TCP to a forward proxy; the request line is rewritten to an
    /// absolute `http://domain...` URI while `Host` stays on the domain.
    Proxy { host: String, port: u16 },
}

/// One of the four mutually exclusive protocol-level outcomes. The fifth
/// outcome, deadline expiry, is handled by the caller's timeout race.
#[derive(Debug)]
enum ProbeEvent {
    Response { status: u16, headers: HashMap<String, String> },
    Continue,
    Upgrade { headers: HashMap<String, String> },
}

/// Runs the whole catalog against one resolved IP, all probes
/// concurrently, each isolated with its own connection and deadline.
/// Returns a flat probe-name → result map; grouping by family is a
/// presentation concern.
pub async fn run_probe_battery(domain: &str, proxy_ip: Ipv4Addr) -> HashMap<String, ProbeResult> {
    info!(domain, %proxy_ip, "Starting payload probe battery.");
    let mut set = JoinSet::new();

    for spec in CATALOG {
        let domain = domain.to_string();
        let target = if spec.uses_proxy_routing() {
            ProbeTarget::Proxy { host: proxy_ip.to_string(), port: 80 }
        } else {
            ProbeTarget::Direct { port: 443 }
        };
        set.spawn(async move {
            let result = execute_probe(spec, &domain, &target, PROBE_TIMEOUT).await;
            (spec.name.to_string(), result)
        });
    }

    let mut results = HashMap::with_capacity(CATALOG.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((name, result)) => {
                results.insert(name, result);
            }
            Err(e) => warn!(error = %e, "Probe task failed to join."),
        }
    }

    let successes = results.values().filter(|r| r.success).count();
    info!(domain, successes, total = results.len(), "Payload probe battery finished.");
    results
}

/// Executes a single probe: exactly one outcome is recorded, whichever
/// of {response, continue, upgrade, transport error, deadline} wins the
/// race. The connection is dropped on every path, including deadline
/// expiry (the in-flight future is aborted by the timeout).
pub(crate) async fn execute_probe(
    spec: &ProbeSpec,
    domain: &str,
    target: &ProbeTarget,
    deadline: Duration,
) -> ProbeResult {
    debug!(probe = spec.name, domain, "Executing probe.");
    match timeout(deadline, dispatch(spec, domain, target)).await {
        Ok(Ok(event)) => event_to_result(spec, event),
        Ok(Err(message)) => {
            debug!(probe = spec.name, error = %message, "Probe transport error.");
            failure_result(spec, message)
        }
        Err(_) => {
            debug!(probe = spec.name, "Probe deadline exceeded.");
            failure_result(spec, "Timeout".to_string())
        }
    }
}

async fn dispatch(spec: &ProbeSpec, domain: &str, target: &ProbeTarget) -> Result<ProbeEvent, String> {
    match target {
        ProbeTarget::Direct { port } => {
            let head = build_request_head(spec, domain, false);
            let tcp = TcpStream::connect((domain, *port))
                .await
                .map_err(|e| e.to_string())?;
            let server_name =
                rustls::ServerName::try_from(domain).map_err(|e| e.to_string())?;
            let stream = insecure_tls_connector()
                .connect(server_name, tcp)
                .await
                .map_err(|e| e.to_string())?;
            exchange(stream, &head).await
        }
        ProbeTarget::Proxy { host, port } => {
            let head = build_request_head(spec, domain, true);
            // Proxy-side DNS goes through the alternate resolver pair,
            // never the system resolver.
            let ip = dns_scanner::resolve_via_alternate(host)
                .await
                .ok_or_else(|| format!("could not resolve proxy target '{}'", host))?;
            let addr = SocketAddr::from((ip, *port));
            let stream = TcpStream::connect(addr).await.map_err(|e| e.to_string())?;
            exchange(stream, &head).await
        }
    }
}

/// Renders the request head for a spec. `Host` is forced to the literal
/// domain (last write wins over whatever the template carries); the body
/// is never sent, even for payloads that advertise one.
pub(crate) fn build_request_head(spec: &ProbeSpec, domain: &str, proxied: bool) -> String {
    let mut path = spec.path.replace("{host}", domain);
    if proxied {
        // Forward-proxy request form: absolute URI in the request line.
        path = format!("http://{}{}", domain, path);
    }

    let mut head = format!("{} {} HTTP/1.1\r\n", spec.method, path);
    let mut saw_host = false;
    for (name, value) in spec.headers {
        if name.eq_ignore_ascii_case("host") {
            head.push_str(&format!("Host: {}\r\n", domain));
            saw_host = true;
        } else {
            head.push_str(&format!("{}: {}\r\n", name, value.replace("{host}", domain)));
        }
    }
    if !saw_host {
        head.push_str(&format!("Host: {}\r\n", domain));
    }
    head.push_str("\r\n");
    head
}

/// Writes the request head and reads exactly one response head, mapping
/// it onto the probe event sum type. The stream is dropped when this
/// returns, tearing the connection down whatever the outcome.
async fn exchange<S>(mut stream: S, head: &str) -> Result<ProbeEvent, String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(head.as_bytes())
        .await
        .map_err(|e| e.to_string())?;

    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if find_head_end(&buffer).is_some() {
            break;
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err("response head too large".to_string());
        }
    }

    parse_response_head(&buffer)
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_response_head(buffer: &[u8]) -> Result<ProbeEvent, String> {
    let end = find_head_end(buffer).unwrap_or(buffer.len());
    let head = String::from_utf8_lossy(&buffer[..end]);
    let mut lines = head.lines();

    let status_line = lines.next().ok_or_else(|| "empty response".to_string())?;
    let mut parts = status_line.split_whitespace();
    let version = parts.next().ok_or_else(|| "malformed status line".to_string())?;
    if !version.starts_with("HTTP/") {
        return Err(format!("not an HTTP response: '{}'", status_line));
    }
    let status: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| format!("malformed status line: '{}'", status_line))?;

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Ok(match status {
        100 => ProbeEvent::Continue,
        101 => ProbeEvent::Upgrade { headers },
        _ => ProbeEvent::Response { status, headers },
    })
}

fn event_to_result(spec: &ProbeSpec, event: ProbeEvent) -> ProbeResult {
    match event {
        // The interim response is the whole point of the Expect probes:
        // record that 100-continue is honored and never send the body.
        ProbeEvent::Continue => ProbeResult {
            name: spec.name.to_string(),
            family: spec.family,
            status: 100,
            success: true,
            headers: HashMap::from([
                ("status".to_string(), "100 Continue".to_string()),
                ("connection".to_string(), "keep-alive".to_string()),
                ("content-length".to_string(), "1024".to_string()),
            ]),
            error: None,
        },
        // The upgraded socket is discarded immediately; tunnel setup
        // beyond the 101 is out of scope for a probe.
        ProbeEvent::Upgrade { headers } => ProbeResult {
            name: spec.name.to_string(),
            family: spec.family,
            status: 101,
            success: true,
            headers,
            error: None,
        },
        ProbeEvent::Response { status, headers } => ProbeResult {
            name: spec.name.to_string(),
            family: spec.family,
            status,
            success: SUCCESS_CODES.contains(&status),
            headers,
            error: None,
        },
    }
}

fn failure_result(spec: &ProbeSpec, message: String) -> ProbeResult {
    ProbeResult {
        name: spec.name.to_string(),
        family: spec.family,
        status: 0,
        success: false,
        headers: HashMap::new(),
        error: Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn spec_by_name(name: &str) -> &'static ProbeSpec {
        CATALOG.iter().find(|s| s.name == name).unwrap()
    }

    /// Accepts one connection, captures the request head, and answers
    /// with a scripted response.
    async fn scripted_listener(response: &'static str) -> (SocketAddr, tokio::sync::oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // The head may arrive in several segments; keep reading
            // until the blank line shows up.
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..n]);
                if find_head_end(&buffer).is_some() {
                    break;
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&buffer).to_string());
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        (addr, rx)
    }

    #[test]
    fn catalog_has_fifteen_uniquely_named_specs() {
        assert_eq!(CATALOG.len(), 15);
        let names: HashSet<&str> = CATALOG.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn catalog_family_membership_is_fixed() {
        let count = |family| CATALOG.iter().filter(|s| s.family == family).count();
        assert_eq!(count(ProbeFamily::Vivo), 4);
        assert_eq!(count(ProbeFamily::Tim), 4);
        assert_eq!(count(ProbeFamily::Split), 2);
        assert_eq!(count(ProbeFamily::General), 5);

        // Only Split payloads route through a proxy.
        for spec in CATALOG {
            assert_eq!(spec.uses_proxy_routing(), spec.family == ProbeFamily::Split, "{}", spec.name);
        }
    }

    #[test]
    fn request_head_forces_host_and_substitutes_placeholders() {
        let head = build_request_head(spec_by_name("Vivo Proxy"), "example.com", false);
        assert!(head.starts_with("GET http://example.com/ HTTP/1.1\r\n"));
        assert!(head.contains("Host: example.com\r\n"));
        assert!(head.contains("X-Online-Host: example.com\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
        assert!(!head.contains("{host}"));
    }

    #[test]
    fn proxied_head_carries_absolute_uri() {
        let head = build_request_head(spec_by_name("Split Direct"), "example.com", true);
        assert!(head.starts_with("CONNECT http://example.com/example.com:443 HTTP/1.1\r\n"));
        assert!(head.contains("Host: example.com\r\n"));

        let head = build_request_head(spec_by_name("Split ACL"), "example.com", true);
        assert!(head.starts_with("ACL http://example.com/ HTTP/1.1\r\n"));
    }

    #[test]
    fn connect_head_uses_host_port_form() {
        let head = build_request_head(spec_by_name("CONNECT Direct"), "example.com", false);
        assert!(head.starts_with("CONNECT example.com:443 HTTP/1.1\r\n"));
    }

    #[test]
    fn success_is_exactly_the_tolerated_status_set() {
        let spec = spec_by_name("Direct GET");
        for status in [100u16, 101, 200] {
            let event = ProbeEvent::Response { status, headers: HashMap::new() };
            assert!(event_to_result(spec, event).success, "{status}");
        }
        for status in [201u16, 204, 301, 302, 403, 404, 500, 502] {
            let event = ProbeEvent::Response { status, headers: HashMap::new() };
            assert!(!event_to_result(spec, event).success, "{status}");
        }
    }

    #[test]
    fn response_head_parsing_handles_the_event_families() {
        let ok = parse_response_head(b"HTTP/1.1 200 OK\r\nServer: test\r\n\r\n").unwrap();
        assert!(matches!(ok, ProbeEvent::Response { status: 200, .. }));

        let cont = parse_response_head(b"HTTP/1.1 100 Continue\r\n\r\n").unwrap();
        assert!(matches!(cont, ProbeEvent::Continue));

        let upgrade =
            parse_response_head(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n")
                .unwrap();
        match upgrade {
            ProbeEvent::Upgrade { headers } => {
                assert_eq!(headers.get("upgrade").map(String::as_str), Some("websocket"));
            }
            other => panic!("expected upgrade, got {:?}", other),
        }

        assert!(parse_response_head(b"SSH-2.0-OpenSSH_9.6\r\n\r\n").is_err());
        assert!(parse_response_head(b"").is_err());
    }

    #[tokio::test]
    async fn split_probe_hits_proxy_peer_with_domain_anchored_request() {
        let (addr, captured) = scripted_listener("HTTP/1.1 200 OK\r\nVia: proxy\r\n\r\n").await;

        let target = ProbeTarget::Proxy { host: addr.ip().to_string(), port: addr.port() };
        let result = execute_probe(
            spec_by_name("Split Direct"),
            "example.com",
            &target,
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(result.status, 200);
        assert!(result.success);
        assert_eq!(result.headers.get("via").map(String::as_str), Some("proxy"));

        // The TCP peer was the local "proxy", yet the request line and
        // Host header stay anchored to the original domain.
        let head = captured.await.unwrap();
        assert!(head.starts_with("CONNECT http://example.com/example.com:443 HTTP/1.1\r\n"));
        assert!(head.contains("Host: example.com\r\n"));
    }

    #[tokio::test]
    async fn interim_continue_short_circuits_with_synthetic_headers() {
        let (addr, _captured) = scripted_listener("HTTP/1.1 100 Continue\r\n\r\n").await;

        let target = ProbeTarget::Proxy { host: addr.ip().to_string(), port: addr.port() };
        let result = execute_probe(
            spec_by_name("Split ACL"),
            "example.com",
            &target,
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(result.status, 100);
        assert!(result.success);
        assert_eq!(result.headers.get("status").map(String::as_str), Some("100 Continue"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn accepted_upgrade_is_recorded_and_socket_discarded() {
        let (addr, _captured) = scripted_listener(
            "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n",
        )
        .await;

        let target = ProbeTarget::Proxy { host: addr.ip().to_string(), port: addr.port() };
        let result = execute_probe(
            spec_by_name("Split ACL"),
            "example.com",
            &target,
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(result.status, 101);
        assert!(result.success);
        assert_eq!(result.headers.get("upgrade").map(String::as_str), Some("websocket"));
    }

    #[tokio::test]
    async fn silent_peer_yields_timeout_within_deadline_plus_slack() {
        // Accepts and then says nothing.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let deadline = Duration::from_millis(200);
        let started = Instant::now();
        let target = ProbeTarget::Proxy { host: addr.ip().to_string(), port: addr.port() };
        let result = execute_probe(spec_by_name("Split ACL"), "example.com", &target, deadline).await;
        let elapsed = started.elapsed();

        assert_eq!(result.status, 0);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Timeout"));
        assert!(elapsed < deadline + Duration::from_millis(500), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error_not_a_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = ProbeTarget::Proxy { host: addr.ip().to_string(), port: addr.port() };
        let result = execute_probe(
            spec_by_name("Split Direct"),
            "example.com",
            &target,
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(result.status, 0);
        assert!(!result.success);
        let error = result.error.unwrap();
        assert_ne!(error, "Timeout");
    }
}
