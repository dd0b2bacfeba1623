//! # Hostname Model
//!
//! Every comparison in the scanner happens on normalized hostnames:
//! trimmed, lower-cased and qualified with a trailing dot.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid domain {input:?}: {reason}")]
pub struct DomainError {
    pub input: String,
    pub reason: &'static str,
}

/// Normalizes a hostname to its lower-case, trailing-dot form.
///
/// Returns `None` for blank input and for the bare root (`"."`), which never
/// names a usable host.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    let mut normalized = trimmed.to_ascii_lowercase();
    normalized.push('.');
    Some(normalized)
}

fn has_empty_label(fqdn: &str) -> bool {
    fqdn.trim_end_matches('.').split('.').any(str::is_empty)
}

/// A domain under scan. Stored lower-case without the trailing dot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully-qualified form, e.g. `vuln.test.`.
    pub fn fqdn(&self) -> String {
        format!("{}.", self.0)
    }

    /// Whether `name` (any form) refers to this exact domain.
    pub fn is_same_name(&self, name: &str) -> bool {
        normalize_hostname(name).is_some_and(|n| n == self.fqdn())
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| DomainError {
            input: s.to_string(),
            reason,
        };
        if s.trim().chars().any(char::is_whitespace) {
            return Err(err("contains whitespace"));
        }
        let fqdn = normalize_hostname(s).ok_or_else(|| err("empty name"))?;
        if has_empty_label(&fqdn) {
            return Err(err("empty label"));
        }
        Ok(Self(fqdn.trim_end_matches('.').to_string()))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A nameserver hostname in normalized trailing-dot form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameserverRecord(String);

impl NameserverRecord {
    /// Normalizes `raw`; blank entries yield `None`.
    pub fn new(raw: &str) -> Option<Self> {
        normalize_hostname(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hostname without its trailing dot, suitable for address lookups.
    pub fn host(&self) -> &str {
        self.0.trim_end_matches('.')
    }
}

impl fmt::Display for NameserverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `name` is `zone` or lies below it. Both must be normalized.
pub fn is_within_zone(name: &str, zone: &str) -> bool {
    if zone == "." || name == zone {
        return true;
    }
    name.len() > zone.len()
        && name.ends_with(zone)
        && name.as_bytes()[name.len() - zone.len() - 1] == b'.'
}

/// Number of labels in a normalized name; the root has zero.
pub fn label_count(name: &str) -> usize {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split('.').count()
    }
}
