//! Server version strings and their ordering.

use std::cmp::Ordering;
use std::fmt;

/// Raw value used when the server does not report a version.
const UNKNOWN: &str = "unknown";

/// A server build identifier, e.g. `"3.36"` or a commit-hash-like string.
///
/// Ordering: the string is split on `.`, each segment parsed as an
/// integer with non-numeric segments sorting as the maximum value, then
/// compared lexicographically with length as the final tiebreak. A
/// blank version is the minimum; the `unknown` sentinel (non-numeric)
/// out-ranks any numeric release.
#[derive(Debug, Clone)]
pub struct ServerVersion {
    raw: String,
}

impl ServerVersion {
    pub fn new(raw: impl Into<String>) -> ServerVersion {
        ServerVersion { raw: raw.into() }
    }

    /// Sentinel for a login response without a version header.
    pub fn unknown() -> ServerVersion {
        ServerVersion::new(UNKNOWN)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segments(&self) -> Vec<u64> {
        let trimmed = self.raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed
            .split('.')
            .map(|s| s.trim().parse::<u64>().unwrap_or(u64::MAX))
            .collect()
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &ServerVersion) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for ServerVersion {}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &ServerVersion) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &ServerVersion) -> Ordering {
        // Vec ordering is lexicographic with length as tiebreak: more
        // segments out-rank an otherwise equal prefix.
        self.segments().cmp(&other.segments())
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
