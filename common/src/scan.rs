//! # Scan Results
//!
//! Probe classifications, findings and the per-run report.

use std::fmt;

use crate::domain::{Domain, NameserverRecord};

/// Classification of a direct query to a delegated nameserver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    /// The server answered (NOERROR or another non-risk code).
    Answered,
    /// Authoritative "no such name"; the zone is still managed.
    NXDomain,
    ServFail,
    Refused,
    /// No exchange was possible; inconclusive.
    Unreachable,
}

impl ProbeStatus {
    /// SERVFAIL and REFUSED are the dangling-delegation signal. Nothing else is.
    pub fn is_risk(self) -> bool {
        matches!(self, ProbeStatus::ServFail | ProbeStatus::Refused)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProbeStatus::Answered => "ANSWERED",
            ProbeStatus::NXDomain => "NXDOMAIN",
            ProbeStatus::ServFail => "SERVFAIL",
            ProbeStatus::Refused => "REFUSED",
            ProbeStatus::Unreachable => "UNREACHABLE",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => f.write_str("High"),
        }
    }
}

/// A trusted nameserver that failed or refused to answer for its zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub domain: Domain,
    pub nameserver: NameserverRecord,
    /// Label of the trust pattern that matched.
    pub provider: String,
    /// Cosmetic label from the provider table.
    pub classified_provider: String,
    pub status: ProbeStatus,
    pub risk: RiskLevel,
}

/// A unit of work that could not be evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped {
    pub domain: Domain,
    /// `None` when discovery itself failed.
    pub nameserver: Option<NameserverRecord>,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub findings: Vec<Finding>,
    pub skipped: Vec<Skipped>,
    pub domains_scanned: usize,
    pub nameservers_probed: usize,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.skipped.is_empty()
    }
}
