// src/core/scanner/hosting_scanner.rs

use crate::core::knowledge_base::{HOSTING_PROVIDER_RULES, looks_like_datacenter, match_signature};
use crate::core::models::{GeoInfo, HostingInfo, HostingKind};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

const IP_INTEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Subset of the ipapi.co response this classifier cares about.
#[derive(Debug, Deserialize)]
struct IpIntelResponse {
    #[serde(default)]
    org: String,
}

/// Subset of the ip-api.com response. `status` is "success" when the
/// lookup worked; everything else is passthrough for the report.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    isp: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
}

fn intel_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .user_agent("tunnelprobe/0.1")
        .timeout(IP_INTEL_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

/// Classifies the hosting behind an IP from its IP-intelligence
/// organization string. First matching provider fragment wins and marks
/// the address as VPS/Cloud; a generic datacenter indicator falls back to
/// Datacenter with the raw organization string; anything else is
/// Dedicated/Other. Network failure yields `None`.
pub async fn classify_hosting(ip: Ipv4Addr) -> Option<HostingInfo> {
    debug!(%ip, "Querying IP intelligence for hosting classification.");
    let client = intel_client()
        .map_err(|e| warn!(%ip, error = %e, "Hosting lookup unavailable."))
        .ok()?;

    let url = format!("https://ipapi.co/{}/json/", ip);
    let intel: IpIntelResponse = client
        .get(&url)
        .send()
        .await
        .map_err(|e| warn!(%ip, error = %e, "Hosting lookup request failed."))
        .ok()?
        .json()
        .await
        .map_err(|e| warn!(%ip, error = %e, "Hosting lookup response unreadable."))
        .ok()?;

    let hosting = classify_org(&intel.org);
    info!(%ip, provider = %hosting.provider, kind = ?hosting.kind, "Hosting classified.");
    Some(hosting)
}

/// Pure classification of an organization string against the provider
/// knowledge base.
pub fn classify_org(org: &str) -> HostingInfo {
    if let Some(provider) = match_signature(HOSTING_PROVIDER_RULES, org) {
        return HostingInfo {
            provider: provider.to_string(),
            kind: HostingKind::VpsCloud,
        };
    }

    if looks_like_datacenter(org) {
        return HostingInfo {
            provider: org.to_string(),
            kind: HostingKind::Datacenter,
        };
    }

    HostingInfo {
        provider: org.to_string(),
        kind: HostingKind::DedicatedOther,
    }
}

/// Fetches the geolocation snippet for an IP. Pure passthrough: city,
/// country, ISP and region are reported as-is when the upstream lookup
/// says it succeeded, otherwise `None`.
pub async fn lookup_geo(ip: Ipv4Addr) -> Option<GeoInfo> {
    debug!(%ip, "Looking up IP geolocation.");
    let client = intel_client()
        .map_err(|e| warn!(%ip, error = %e, "Geolocation lookup unavailable."))
        .ok()?;

    let url = format!("http://ip-api.com/json/{}", ip);
    let geo: GeoResponse = client
        .get(&url)
        .send()
        .await
        .map_err(|e| warn!(%ip, error = %e, "Geolocation request failed."))
        .ok()?
        .json()
        .await
        .map_err(|e| warn!(%ip, error = %e, "Geolocation response unreadable."))
        .ok()?;

    if geo.status != "success" {
        debug!(%ip, status = %geo.status, "Geolocation lookup reported failure.");
        return None;
    }

    Some(GeoInfo {
        city: geo.city,
        country: geo.country,
        isp: geo.isp,
        region: geo.region_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_fragments_classify_as_vps_cloud() {
        let hosting = classify_org("AS16509 Amazon.com, Inc.");
        assert_eq!(hosting.provider, "AWS");
        assert_eq!(hosting.kind, HostingKind::VpsCloud);

        let hosting = classify_org("OVH SAS");
        assert_eq!(hosting.provider, "OVH");
        assert_eq!(hosting.kind, HostingKind::VpsCloud);
    }

    #[test]
    fn datacenter_indicator_keeps_the_raw_org() {
        let hosting = classify_org("Example Hosting Ltd");
        assert_eq!(hosting.provider, "Example Hosting Ltd");
        assert_eq!(hosting.kind, HostingKind::Datacenter);
    }

    #[test]
    fn unknown_orgs_are_dedicated_other() {
        let hosting = classify_org("Residential Fiber ISP");
        assert_eq!(hosting.provider, "Residential Fiber ISP");
        assert_eq!(hosting.kind, HostingKind::DedicatedOther);
    }

    #[test]
    fn provider_match_takes_priority_over_datacenter_indicator() {
        // "Hetzner" wins even though "datacenter" also appears.
        let hosting = classify_org("Hetzner Datacenter 12");
        assert_eq!(hosting.provider, "Hetzner");
        assert_eq!(hosting.kind, HostingKind::VpsCloud);
    }

    #[tokio::test]
    async fn intel_responses_deserialize_straight_off_the_wire() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Serves one minimal HTTP response with a JSON body.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 4096];
            let _ = socket.read(&mut buffer).await;
            let body = r#"{"status":"success","country":"Brazil","regionName":"Sao Paulo","city":"Sao Paulo","isp":"Example ISP"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        let geo: GeoResponse = intel_client()
            .unwrap()
            .get(format!("http://{}/json/1.2.3.4", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(geo.status, "success");
        assert_eq!(geo.region_name, "Sao Paulo");
        assert_eq!(geo.city, "Sao Paulo");
    }

    #[test]
    fn geo_response_parses_upstream_shape() {
        let raw = r#"{"status":"success","country":"Brazil","regionName":"Sao Paulo",
                      "city":"Sao Paulo","isp":"Example ISP","org":"Example Org"}"#;
        let geo: GeoResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(geo.status, "success");
        assert_eq!(geo.region_name, "Sao Paulo");
        assert_eq!(geo.isp, "Example ISP");
    }
}
