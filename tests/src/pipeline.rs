use std::sync::Arc;
use std::time::Duration;

use dangle_common::config::Config;
use dangle_common::domain::Domain;
use dangle_common::pattern::{PatternError, PatternRegistry};
use dangle_common::provider::ProviderTable;
use dangle_common::scan::{ProbeStatus, RiskLevel};
use dangle_core::error::ResolveError;
use dangle_core::fingerprint::ProviderFingerprint;
use dangle_core::scanner::Scanner;
use dangle_integration_tests::FakeResolver;
use dangle_protocols::dns::Rcode;

fn cloud_patterns() -> PatternRegistry {
    PatternRegistry::from_entries([("*.cloud-provider.com.", "CloudProvider")]).unwrap()
}

fn scanner(resolver: Arc<FakeResolver>, cfg: &Config) -> Scanner {
    let fingerprint = ProviderFingerprint::new(cloud_patterns(), ProviderTable::default());
    Scanner::new(resolver, fingerprint, cfg)
}

fn domains(names: &[&str]) -> Vec<Domain> {
    names.iter().map(|name| name.parse().unwrap()).collect()
}

#[tokio::test]
async fn refused_delegation_is_one_high_finding() {
    let resolver = FakeResolver::default()
        .delegate("vuln.test", &["ns1.cloud-provider.com."])
        .probe("ns1.cloud-provider.com.", "vuln.test", Rcode::Refused);

    let report = scanner(Arc::new(resolver), &Config::default())
        .scan(domains(&["vuln.test"]))
        .await;

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.domain.as_str(), "vuln.test");
    assert_eq!(finding.nameserver.as_str(), "ns1.cloud-provider.com.");
    assert_eq!(finding.provider, "CloudProvider");
    assert_eq!(finding.risk, RiskLevel::High);
    assert_eq!(finding.status, ProbeStatus::Refused);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn undelegated_domain_is_clean() {
    let resolver = Arc::new(FakeResolver::default());
    let report = scanner(resolver.clone(), &Config::default())
        .scan(domains(&["nothing.test"]))
        .await;

    assert!(report.is_clean());
    assert_eq!(report.domains_scanned, 1);
    assert_eq!(report.nameservers_probed, 0);
    assert_eq!(resolver.query_count(), 1);
}

#[tokio::test]
async fn answered_and_nxdomain_are_safe() {
    let resolver = FakeResolver::default()
        .delegate("live.test", &["ns1.cloud-provider.com.", "ns2.cloud-provider.com."])
        .probe("ns1.cloud-provider.com.", "live.test", Rcode::NoError)
        .probe("ns2.cloud-provider.com.", "live.test", Rcode::NXDomain);

    let report = scanner(Arc::new(resolver), &Config::default())
        .scan(domains(&["live.test"]))
        .await;

    assert!(report.is_clean());
    assert_eq!(report.nameservers_probed, 2);
}

#[tokio::test]
async fn unreachable_and_failed_probes_are_skipped_not_flagged() {
    let resolver = FakeResolver::default()
        .delegate("flaky.test", &["ns1.cloud-provider.com.", "ns2.cloud-provider.com."])
        .fail_probe(
            "ns1.cloud-provider.com.",
            "flaky.test",
            ResolveError::NoAddress("ns1.cloud-provider.com".into()),
        )
        .fail_probe(
            "ns2.cloud-provider.com.",
            "flaky.test",
            ResolveError::Timeout {
                server: "192.0.2.2:53".into(),
            },
        );

    let report = scanner(Arc::new(resolver), &Config::default())
        .scan(domains(&["flaky.test"]))
        .await;

    assert!(report.findings.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].reason, "nameserver unreachable");
    assert!(report.skipped[1].reason.contains("probe failed"));
}

#[tokio::test]
async fn reruns_are_identical_and_input_ordered() {
    let resolver = FakeResolver::default()
        .delegate("a.test", &["ns2.cloud-provider.com.", "ns1.cloud-provider.com."])
        .delegate("b.test", &["ns1.cloud-provider.com."])
        .delegate("c.test", &["ns9.cloud-provider.com."])
        .probe("ns2.cloud-provider.com.", "a.test", Rcode::ServFail)
        .probe("ns1.cloud-provider.com.", "a.test", Rcode::Refused)
        .probe("ns1.cloud-provider.com.", "b.test", Rcode::ServFail)
        .probe("ns9.cloud-provider.com.", "c.test", Rcode::Refused)
        .delay("a.test", Duration::from_millis(60))
        .delay("b.test", Duration::from_millis(30));
    let resolver = Arc::new(resolver);
    let cfg = Config {
        domain_workers: 3,
        probe_workers: 2,
        ..Config::default()
    };

    let first = scanner(resolver.clone(), &cfg)
        .scan(domains(&["a.test", "b.test", "c.test"]))
        .await;
    let second = scanner(resolver, &cfg)
        .scan(domains(&["a.test", "b.test", "c.test"]))
        .await;

    assert_eq!(first, second);
    let order: Vec<(&str, &str)> = first
        .findings
        .iter()
        .map(|f| (f.domain.as_str(), f.nameserver.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            ("a.test", "ns2.cloud-provider.com."),
            ("a.test", "ns1.cloud-provider.com."),
            ("b.test", "ns1.cloud-provider.com."),
            ("c.test", "ns9.cloud-provider.com."),
        ]
    );
}

#[tokio::test]
async fn single_worker_still_scans_everything() {
    let resolver = FakeResolver::default()
        .delegate("a.test", &["ns1.cloud-provider.com."])
        .delegate("b.test", &["ns1.cloud-provider.com."])
        .probe("ns1.cloud-provider.com.", "a.test", Rcode::Refused)
        .probe("ns1.cloud-provider.com.", "b.test", Rcode::Refused);
    let cfg = Config {
        domain_workers: 1,
        probe_workers: 1,
        ..Config::default()
    };

    let report = scanner(Arc::new(resolver), &cfg)
        .scan(domains(&["a.test", "b.test"]))
        .await;
    assert_eq!(report.findings.len(), 2);
}

#[tokio::test]
async fn cancelling_mid_scan_keeps_finished_findings() {
    let resolver = FakeResolver::default()
        .delegate("first.test", &["ns1.cloud-provider.com.", "ns2.cloud-provider.com."])
        .delegate("later.test", &["ns1.cloud-provider.com."])
        .probe("ns1.cloud-provider.com.", "first.test", Rcode::Refused)
        .probe("ns2.cloud-provider.com.", "first.test", Rcode::ServFail)
        .probe("ns1.cloud-provider.com.", "later.test", Rcode::Refused)
        .delay("first.test", Duration::from_millis(20));
    let resolver = Arc::new(resolver);
    let cfg = Config {
        domain_workers: 1,
        probe_workers: 2,
        ..Config::default()
    };
    let scanner = scanner(resolver.clone(), &cfg);
    resolver.cancel_when_probed("first.test", scanner.cancel_token());

    let report = scanner.scan(domains(&["first.test", "later.test"])).await;

    assert!(report.cancelled);
    assert_eq!(report.domains_scanned, 1);
    // Both probes were already in flight when the first answer cancelled the scan.
    let statuses: Vec<ProbeStatus> = report.findings.iter().map(|f| f.status).collect();
    assert_eq!(statuses, [ProbeStatus::Refused, ProbeStatus::ServFail]);
    assert!(report.findings.iter().all(|f| f.domain.as_str() == "first.test"));

    let queries = resolver.queries.lock().unwrap();
    assert!(queries.iter().all(|q| !q.name.contains("later.test")));
}

#[test]
fn empty_pattern_fails_before_any_scan() {
    let resolver = FakeResolver::default();
    let loaded = PatternRegistry::from_entries([("*.cloud-provider.com.", "CloudProvider"), ("", "Nothing")]);

    assert!(matches!(loaded, Err(PatternError::MalformedPattern { .. })));
    assert_eq!(resolver.query_count(), 0);
}
