use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DNS_PORT: u16 = 53;
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// How the currently delegated nameservers are found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// One NS query through the upstream recursive resolver.
    #[default]
    Direct,
    /// Walk the referral chain from the root servers.
    Trace,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: DiscoveryMode,
    /// Per-call timeout for every discovery and probe exchange.
    pub timeout: Duration,
    /// Domains scanned concurrently.
    pub domain_workers: usize,
    /// Nameserver probes in flight at once, across all domains.
    pub probe_workers: usize,
    /// Extra attempts after a transport timeout.
    ///
    /// Never applied to a received response, whatever its rcode.
    pub retries: u8,
    /// Recursive resolver used for direct discovery.
    pub upstream: SocketAddr,
    pub quiet: u8,
    pub no_banner: bool,
}

impl Config {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Direct,
            timeout: Duration::from_secs(5),
            domain_workers: 16,
            probe_workers: 8,
            retries: 0,
            upstream: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), DNS_PORT),
            quiet: 0,
            no_banner: false,
        }
    }
}
