// src/core/validator.rs

use once_cell::sync::Lazy;
use regex::Regex;

// Label-based hostname grammar: dot-separated labels of letters, digits
// and hyphens (no leading/trailing hyphen, max 63 chars per label),
// terminated by a top-level label of at least two letters. Rejects IP
// literals, ports, paths and whitespace variants.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$").unwrap()
});

/// Returns true iff `input` is a plausible DNS name. Purely syntactic,
/// no side effects.
pub fn is_valid_domain(input: &str) -> bool {
    DOMAIN_PATTERN.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_domains() {
        assert!(is_valid_domain("google.com"));
        assert!(is_valid_domain("sub.domain.example.org"));
        assert!(is_valid_domain("xn--abc.com"));
        assert!(is_valid_domain("a.co"));
    }

    #[test]
    fn rejects_hyphen_edged_labels() {
        assert!(!is_valid_domain("-bad-.com"));
        assert!(!is_valid_domain("-leading.com"));
        assert!(!is_valid_domain("trailing-.com"));
    }

    #[test]
    fn rejects_empty_labels() {
        assert!(!is_valid_domain("a..b.com"));
        assert!(!is_valid_domain(".com"));
        assert!(!is_valid_domain("example."));
    }

    #[test]
    fn rejects_non_domain_inputs() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("192.168.1.1"));
        assert!(!is_valid_domain("example.com:443"));
        assert!(!is_valid_domain("example.com/path"));
        assert!(!is_valid_domain("example.com "));
        assert!(!is_valid_domain("no-tld"));
        assert!(!is_valid_domain("bad.t"));
    }

    #[test]
    fn rejects_overlong_labels() {
        let label = "a".repeat(64);
        assert!(!is_valid_domain(&format!("{}.com", label)));
        let ok_label = "a".repeat(63);
        assert!(is_valid_domain(&format!("{}.com", ok_label)));
    }
}
