//! Drives the real UDP resolver against a nameserver bound to loopback.

use std::net::SocketAddr;
use std::sync::Arc;

use dangle_common::config::{Config, DiscoveryMode};
use dangle_common::pattern::PatternRegistry;
use dangle_common::provider::ProviderTable;
use dangle_common::scan::ProbeStatus;
use dangle_core::fingerprint::ProviderFingerprint;
use dangle_core::resolver::UdpResolver;
use dangle_core::scanner::Scanner;
use dangle_integration_tests::{question_type, reply};
use tokio::net::UdpSocket;

const QTYPE_A: u16 = 1;
const QTYPE_NS: u16 = 2;
const REFUSED: u8 = 5;
const NOERROR: u8 = 0;

/// Answers every NS query with `localhost.` and every A query with `a_rcode`.
async fn spawn_nameserver(a_rcode: u8) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                break;
            };
            let query = &buf[..len];
            let response = match question_type(query) {
                Some(QTYPE_NS) => reply(query, NOERROR, &["localhost."]),
                Some(QTYPE_A) => reply(query, a_rcode, &[]),
                _ => reply(query, REFUSED, &[]),
            };
            if let Some(response) = response {
                let _ = socket.send_to(&response, peer).await;
            }
        }
    });

    addr
}

fn loopback_scanner(addr: SocketAddr) -> Scanner {
    let cfg = Config {
        mode: DiscoveryMode::Direct,
        upstream: addr,
        ..Config::default()
    };
    let resolver = Arc::new(UdpResolver::new(&cfg).with_port(addr.port()));
    let registry = PatternRegistry::from_entries([("localhost.", "Loopback")]).unwrap();
    Scanner::new(resolver, ProviderFingerprint::new(registry, ProviderTable::default()), &cfg)
}

#[tokio::test]
async fn refusing_nameserver_is_flagged_over_the_wire() {
    let addr = spawn_nameserver(REFUSED).await;

    let report = loopback_scanner(addr).scan(vec!["vuln.test".parse().unwrap()]).await;

    assert_eq!(report.findings.len(), 1, "skipped: {:?}", report.skipped);
    assert_eq!(report.findings[0].nameserver.as_str(), "localhost.");
    assert_eq!(report.findings[0].provider, "Loopback");
    assert_eq!(report.findings[0].status, ProbeStatus::Refused);
}

#[tokio::test]
async fn answering_nameserver_is_clean_over_the_wire() {
    let addr = spawn_nameserver(NOERROR).await;

    let report = loopback_scanner(addr).scan(vec!["live.test".parse().unwrap()]).await;

    assert!(report.is_clean(), "report: {report:?}");
    assert_eq!(report.nameservers_probed, 1);
}
