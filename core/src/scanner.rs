//! The **scan engine**: discovery, fingerprinting and probing over a list of domains.
//!
//! Domains are scanned concurrently, bounded by `domain_workers`; probes are
//! bounded by one `probe_workers` pool shared across all domains. Results are
//! merged after every task completes, so the report order only depends on the
//! input: domains in input order, nameservers in discovery order.
//!
//! Failures stay local. A domain whose discovery fails, or a nameserver that
//! cannot be probed, is recorded as [`Skipped`] and the scan carries on.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use dangle_common::{
    config::Config,
    domain::{Domain, NameserverRecord},
    scan::{Finding, ProbeStatus, RiskLevel, ScanReport, Skipped},
};

use crate::discovery::NameserverDiscovery;
use crate::error::ProbeError;
use crate::fingerprint::ProviderFingerprint;
use crate::probe::{DelegationProbe, ProbeResult};
use crate::resolver::DnsResolver;

/// Cooperative cancellation shared between the caller and the scan.
///
/// Cancelling stops new discovery and probe work; exchanges already in
/// flight run to their reply or timeout.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

type ProgressCallback = Arc<dyn Fn(&Domain, usize) + Send + Sync>;

#[derive(Default)]
struct DomainOutcome {
    findings: Vec<Finding>,
    skipped: Vec<Skipped>,
    probed: usize,
}

struct ScanContext {
    discovery: NameserverDiscovery,
    fingerprint: ProviderFingerprint,
    probe: DelegationProbe,
    probe_limit: Arc<Semaphore>,
    cancel: CancelToken,
}

pub struct Scanner {
    ctx: Arc<ScanContext>,
    domain_workers: usize,
    on_domain_done: Option<ProgressCallback>,
}

impl Scanner {
    pub fn new(resolver: Arc<dyn DnsResolver>, fingerprint: ProviderFingerprint, cfg: &Config) -> Self {
        let discovery = NameserverDiscovery::new(resolver.clone(), cfg.mode);
        Self::from_parts(discovery, fingerprint, DelegationProbe::new(resolver), cfg)
    }

    pub fn from_parts(
        discovery: NameserverDiscovery,
        fingerprint: ProviderFingerprint,
        probe: DelegationProbe,
        cfg: &Config,
    ) -> Self {
        Self {
            ctx: Arc::new(ScanContext {
                discovery,
                fingerprint,
                probe,
                probe_limit: Arc::new(Semaphore::new(cfg.probe_workers.max(1))),
                cancel: CancelToken::default(),
            }),
            domain_workers: cfg.domain_workers.max(1),
            on_domain_done: None,
        }
    }

    /// Token that cancels this scanner's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel.clone()
    }

    /// Called after each domain with the number of domains finished so far.
    pub fn on_domain_done(mut self, callback: impl Fn(&Domain, usize) + Send + Sync + 'static) -> Self {
        self.on_domain_done = Some(Arc::new(callback));
        self
    }

    pub async fn scan(&self, domains: Vec<Domain>) -> ScanReport {
        let mut report = ScanReport::default();
        let domain_limit = Arc::new(Semaphore::new(self.domain_workers));
        let mut tasks = JoinSet::new();
        let mut seen = HashSet::new();

        for (idx, domain) in domains.into_iter().enumerate() {
            if !seen.insert(domain.clone()) {
                debug!("{domain} listed twice, scanning once");
                continue;
            }
            let Ok(permit) = domain_limit.clone().acquire_owned().await else {
                break;
            };
            if self.ctx.cancel.is_cancelled() {
                break;
            }
            let ctx = self.ctx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = ctx.scan_domain(&domain).await;
                (idx, domain, outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, domain, outcome)) => {
                    if let Some(callback) = &self.on_domain_done {
                        callback(&domain, outcomes.len() + 1);
                    }
                    outcomes.push((idx, outcome));
                }
                Err(e) => error!("domain scan task failed: {e}"),
            }
        }

        outcomes.sort_by_key(|(idx, _)| *idx);
        for (_, outcome) in outcomes {
            report.domains_scanned += 1;
            report.nameservers_probed += outcome.probed;
            report.findings.extend(outcome.findings);
            report.skipped.extend(outcome.skipped);
        }
        report.cancelled = self.ctx.cancel.is_cancelled();
        report
    }
}

impl ScanContext {
    async fn scan_domain(self: Arc<Self>, domain: &Domain) -> DomainOutcome {
        let mut outcome = DomainOutcome::default();

        let nameservers = match self.discovery.discover(domain).await {
            Ok(nameservers) => nameservers,
            Err(e) => {
                warn!("skipping {domain}: {e}");
                outcome.skipped.push(Skipped {
                    domain: domain.clone(),
                    nameserver: None,
                    reason: e.to_string(),
                });
                return outcome;
            }
        };

        let mut probes = JoinSet::new();
        for (idx, nameserver) in nameservers.into_iter().enumerate() {
            let Some(label) = self.fingerprint.match_trusted(&nameserver) else {
                debug!("{nameserver} is not watched, not probing");
                continue;
            };
            let label = label.to_string();

            let Ok(permit) = self.probe_limit.clone().acquire_owned().await else {
                break;
            };
            if self.cancel.is_cancelled() {
                break;
            }
            let ctx = self.clone();
            let domain = domain.clone();
            probes.spawn(async move {
                let _permit = permit;
                let result = ctx.probe.probe(&domain, &nameserver).await;
                (idx, nameserver, label, result)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("probe task for {domain} failed: {e}"),
            }
        }
        results.sort_by_key(|(idx, ..)| *idx);

        for (_, nameserver, label, result) in results {
            outcome.probed += 1;
            self.record(domain, nameserver, label, result, &mut outcome);
        }
        outcome
    }

    fn record(
        &self,
        domain: &Domain,
        nameserver: NameserverRecord,
        label: String,
        result: Result<ProbeResult, ProbeError>,
        outcome: &mut DomainOutcome,
    ) {
        match result {
            Ok(ProbeResult { status, .. }) if status.is_risk() => {
                warn!("{domain}: {nameserver} ({label}) returned {status}, possible dangling delegation");
                outcome.findings.push(Finding {
                    domain: domain.clone(),
                    classified_provider: self.fingerprint.classify_provider(&nameserver).to_string(),
                    nameserver,
                    provider: label,
                    status,
                    risk: RiskLevel::High,
                });
            }
            Ok(ProbeResult {
                status: ProbeStatus::Unreachable,
                ..
            }) => {
                warn!("{domain}: {nameserver} is unreachable");
                outcome.skipped.push(Skipped {
                    domain: domain.clone(),
                    nameserver: Some(nameserver),
                    reason: "nameserver unreachable".to_string(),
                });
            }
            Ok(ProbeResult { status, .. }) => {
                debug!("{domain}: {nameserver} is serving the zone ({status})");
            }
            Err(e) => {
                warn!("{domain}: {nameserver}: {e}");
                outcome.skipped.push(Skipped {
                    domain: domain.clone(),
                    nameserver: Some(nameserver),
                    reason: e.to_string(),
                });
            }
        }
    }
}
