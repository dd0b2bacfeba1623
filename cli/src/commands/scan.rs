use std::sync::Arc;
use std::time::Instant;

use colored::*;
use tracing::{Instrument, info_span};

use dangle_common::{
    config::Config,
    domain::Domain,
    pattern::PatternRegistry,
    provider::ProviderTable,
    scan::ScanReport,
    success, warn,
};
use dangle_core::{fingerprint::ProviderFingerprint, resolver::UdpResolver, scanner::Scanner};

use crate::terminal::{colors, format, print, spinner};

pub async fn scan(domains: Vec<Domain>, registry: PatternRegistry, cfg: &Config) -> anyhow::Result<()> {
    if domains.is_empty() {
        warn!("Domain list is empty, nothing to scan");
    }

    print::header("scanning delegations", cfg.quiet);
    let report = run(domains, registry, cfg).await;
    scan_ends(&report, cfg);
    Ok(())
}

pub(crate) async fn run(domains: Vec<Domain>, registry: PatternRegistry, cfg: &Config) -> ScanReport {
    let span = info_span!("scan", indicatif.pb_show = true);
    spinner::start_scan_progress(&span, domains.len());

    let resolver = Arc::new(UdpResolver::new(cfg));
    let fingerprint = ProviderFingerprint::new(registry, ProviderTable::default());
    let progress = span.clone();
    let scanner = Scanner::new(resolver, fingerprint, cfg)
        .on_domain_done(move |domain, done| spinner::report_scan_progress(&progress, domain, done));

    let cancel = scanner.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for in-flight probes");
            cancel.cancel();
        }
    });

    let start_time = Instant::now();
    let report = scanner.scan(domains).instrument(span).await;
    interrupt.abort();

    success!("Scanned {} domains in {:.2}s", report.domains_scanned, start_time.elapsed().as_secs_f64());
    report
}

pub(crate) fn scan_ends(report: &ScanReport, cfg: &Config) {
    if report.findings.is_empty() {
        no_findings(cfg);
    } else {
        print::header("dangling delegations", cfg.quiet);
        print_findings(report, cfg);
    }

    if !report.skipped.is_empty() {
        print::header("skipped", cfg.quiet);
        print_skipped(report);
    }

    print_summary(report, cfg);
}

fn no_findings(cfg: &Config) {
    print::header("no risky delegations", cfg.quiet);
    if cfg.quiet == 0 {
        print::no_results();
    }
}

fn print_findings(report: &ScanReport, cfg: &Config) {
    for (idx, finding) in report.findings.iter().enumerate() {
        match cfg.quiet {
            2 => print::print_status(format::finding_line(finding)),
            _ => {
                print::tree_head(idx, finding.domain.as_str());
                print::as_tree_one_level(format::finding_to_details(finding));
            }
        }
        if cfg.quiet < 2 && idx + 1 != report.findings.len() {
            print::print("");
        }
    }
}

fn print_skipped(report: &ScanReport) {
    for skipped in &report.skipped {
        let unit: String = match &skipped.nameserver {
            Some(ns) => format!("{} @ {}", skipped.domain, ns),
            None => skipped.domain.to_string(),
        };
        print::print_status(format!("{} {}", unit.color(colors::PRIMARY), skipped.reason.color(colors::SEPARATOR)));
    }
}

fn print_summary(report: &ScanReport, cfg: &Config) {
    let findings: ColoredString = if report.findings.is_empty() {
        "0 findings".bold().green()
    } else {
        format!("{} findings", report.findings.len()).bold().red()
    };
    let domains: ColoredString = format!("{} domains", report.domains_scanned).bold().yellow();
    let probed: ColoredString = format!("{} probes", report.nameservers_probed).bold().yellow();
    let output = format!("Scan Complete: {findings} across {domains} ({probed})").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => success!("{}", output),
    }

    if report.cancelled {
        warn!("Scan was cancelled, results are partial");
    }
    print::end_of_program(cfg.quiet);
}
