// src/core/scanner/http_scanner.rs

use crate::core::models::HttpStatusInfo;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Checks plain HTTP(S) reachability of the domain. HTTPS is tried
/// first, then HTTP; the first scheme that yields any response wins and
/// its status code is reported verbatim (redirects followed up to 5
/// hops, no status is considered an error). `None` means neither scheme
/// produced a response.
pub async fn check_http_status(domain: &str) -> Option<HttpStatusInfo> {
    let client = match reqwest::Client::builder()
        .user_agent("tunnelprobe/0.1")
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to build HTTP client for status check.");
            return None;
        }
    };

    for (protocol, url) in [
        ("HTTPS", format!("https://{}", domain)),
        ("HTTP", format!("http://{}", domain)),
    ] {
        match client.get(&url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                info!(url = %url, status, "HTTP reachability check succeeded.");
                return Some(HttpStatusInfo {
                    protocol: protocol.to_string(),
                    status,
                });
            }
            Err(e) => {
                debug!(url = %url, error = %e, "HTTP reachability attempt failed.");
            }
        }
    }

    debug!(domain, "No scheme produced an HTTP response.");
    None
}
