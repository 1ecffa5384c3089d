//! IPv4 extraction
//!
//! Scans text for dotted-quad tokens. Octets are not range-checked, so
//! `999.999.999.999` is returned as-is, and CIDR suffixes are dropped
//! (`173.245.48.0/20` yields `173.245.48.0`). Word boundaries are ASCII-only,
//! so a non-ASCII letter touching an address does not hide it.

use regex::Regex;
use std::sync::OnceLock;

const IPV4_PATTERN: &str = r"(?-u:\b)[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}(?-u:\b)";

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IPV4_PATTERN).expect("IPv4 pattern is a valid regex"))
}

/// Return every dotted-quad token in `text`, in order of appearance,
/// duplicates included.
pub fn extract_ipv4(text: &str) -> Vec<String> {
    ipv4_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
