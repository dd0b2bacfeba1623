pub mod check;
pub mod patterns;
pub mod scan;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use dangle_common::config::{Config, DiscoveryMode};
use dangle_common::domain::Domain;

#[derive(Parser)]
#[command(name = "dangle")]
#[command(about = "Finds dangling DNS delegations that leave subdomains open to takeover.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Discover nameservers by walking referrals from the root
    #[arg(long, global = true)]
    pub trace: bool,

    /// Provider pattern file, one `<pattern> <label>` per line
    #[arg(short, long, global = true, value_name = "FILE")]
    pub patterns: Option<PathBuf>,

    /// Per-query timeout in seconds
    #[arg(short, long, global = true, default_value_t = 5)]
    pub timeout: u64,

    /// Domains scanned in parallel
    #[arg(short, long, global = true, default_value_t = 16)]
    pub workers: usize,

    /// Nameserver probes in flight at once
    #[arg(long, global = true, default_value_t = 8)]
    pub probe_workers: usize,

    /// Retries after a timeout (never after a SERVFAIL or REFUSED)
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u8,

    /// Recursive resolver used for direct discovery
    #[arg(long, global = true, default_value = "1.1.1.1:53")]
    pub upstream: SocketAddr,

    /// Reduce output, repeat for less
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan every domain listed in a file
    #[command(alias = "s")]
    Scan { file: PathBuf },
    /// Check a single domain
    #[command(alias = "c")]
    Check { domain: Domain },
    /// Show the provider patterns that decide what gets probed
    #[command(alias = "p")]
    Patterns,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_config(&self) -> Config {
        let mode = if self.trace {
            DiscoveryMode::Trace
        } else {
            DiscoveryMode::Direct
        };
        Config {
            mode,
            domain_workers: self.workers,
            probe_workers: self.probe_workers,
            retries: self.retries,
            upstream: self.upstream,
            quiet: self.quiet,
            no_banner: self.no_banner,
            ..Config::default()
        }
        .with_timeout(Duration::from_secs(self.timeout))
    }
}
