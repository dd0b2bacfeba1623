use dangle_common::{config::Config, domain::Domain, pattern::PatternRegistry};

use super::scan;
use crate::terminal::print;

/// Scans one domain given on the command line.
pub async fn check(domain: Domain, registry: PatternRegistry, cfg: &Config) -> anyhow::Result<()> {
    print::header(&format!("checking {domain}"), cfg.quiet);
    let report = scan::run(vec![domain], registry, cfg).await;
    scan::scan_ends(&report, cfg);
    Ok(())
}
