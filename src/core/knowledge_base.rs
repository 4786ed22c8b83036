// src/core/knowledge_base.rs

//! Static, read-only classifier intelligence: the reverse-DNS hostname
//! signatures of well-known CDN operators and the organization-string
//! fragments of well-known cloud/VPS providers. Making this data-driven
//! keeps the classifiers free of per-vendor branching and easy to extend.

use once_cell::sync::Lazy;
use regex::Regex;

/// A signature rule mapping a hostname/organization fragment pattern to a
/// canonical operator name. Order in the tables matters: the first
/// matching rule wins.
pub struct SignatureRule {
    /// Canonical operator name reported on a match (e.g. "Fastly").
    pub name: &'static str,
    /// Case-insensitive fragment pattern tested against the candidate.
    pub pattern: &'static Lazy<Regex>,
}

// Case-insensitive fragment patterns, compiled once.
static RE_AKAMAI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(akamai|akam)").unwrap());
static RE_FASTLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)fastly").unwrap());
static RE_CLOUDFRONT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(cloudfront|amazon)").unwrap());
static RE_GOOGLE_CDN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(google|googleusercontent)").unwrap());
static RE_AZURE_CDN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(azure|msedge)").unwrap());

static RE_AWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(amazon|aws)").unwrap());
static RE_GCP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(google|googlecloud)").unwrap());
static RE_AZURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(microsoft|azure|msft)").unwrap());
static RE_DIGITALOCEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)digitalocean").unwrap());
static RE_LINODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)linode").unwrap());
static RE_OVH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ovh").unwrap());
static RE_VULTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)vultr").unwrap());
static RE_HETZNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)hetzner").unwrap());

static RE_DATACENTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(datacenter|hosting|cloud)").unwrap());

/// CDN operators detectable from reverse-DNS hostnames. Cloudflare is
/// absent on purpose: it publishes its IP ranges and is matched by the
/// CIDR test in `cdn_scanner`, which takes priority over this table.
pub static CDN_HOSTNAME_RULES: &[SignatureRule] = &[
    SignatureRule { name: "Akamai", pattern: &RE_AKAMAI },
    SignatureRule { name: "Fastly", pattern: &RE_FASTLY },
    SignatureRule { name: "Amazon CloudFront", pattern: &RE_CLOUDFRONT },
    SignatureRule { name: "Google Cloud CDN", pattern: &RE_GOOGLE_CDN },
    SignatureRule { name: "Microsoft Azure CDN", pattern: &RE_AZURE_CDN },
];

/// Cloud/VPS providers detectable from an IP-intelligence organization
/// string. A match classifies the address as VPS/Cloud hosting.
pub static HOSTING_PROVIDER_RULES: &[SignatureRule] = &[
    SignatureRule { name: "AWS", pattern: &RE_AWS },
    SignatureRule { name: "Google Cloud", pattern: &RE_GCP },
    SignatureRule { name: "Azure", pattern: &RE_AZURE },
    SignatureRule { name: "DigitalOcean", pattern: &RE_DIGITALOCEAN },
    SignatureRule { name: "Linode", pattern: &RE_LINODE },
    SignatureRule { name: "OVH", pattern: &RE_OVH },
    SignatureRule { name: "Vultr", pattern: &RE_VULTR },
    SignatureRule { name: "Hetzner", pattern: &RE_HETZNER },
];

/// Generic datacenter indicator used as a fallback when no provider rule
/// matches the organization string.
pub fn looks_like_datacenter(org: &str) -> bool {
    RE_DATACENTER.is_match(org)
}

/// Walks a rule table and returns the canonical name of the first rule
/// whose pattern matches the candidate string.
pub fn match_signature(rules: &[SignatureRule], candidate: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(candidate))
        .map(|rule| rule.name)
}
