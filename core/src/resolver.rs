//! The DNS capability the pipeline is built on.
//!
//! Discovery and probing only ever talk to a [`DnsResolver`]; [`UdpResolver`]
//! is the network-backed implementation.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use dangle_common::config::{Config, DNS_PORT};
use dangle_protocols::{
    dns::{self, DnsMessage, RecordType},
    udp::{self, ExchangeError},
};

use crate::error::ResolveError;

/// Where a query goes when it bypasses the upstream resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ServerAddr {
    Ip(IpAddr),
    /// A nameserver hostname, looked up by the resolver implementation.
    Host(String),
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerAddr::Ip(ip) => write!(f, "{ip}"),
            ServerAddr::Host(host) => f.write_str(host),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub name: String,
    pub record_type: RecordType,
    /// `None` sends the query through the upstream recursive resolver.
    pub server: Option<ServerAddr>,
    pub recursion: bool,
}

impl Query {
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            server: None,
            recursion: true,
        }
    }

    /// Targets `server` directly with recursion turned off.
    pub fn to_server(mut self, server: ServerAddr) -> Self {
        self.server = Some(server);
        self.recursion = false;
        self
    }
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Performs one exchange. Any decoded response is `Ok`, whatever its rcode.
    async fn query(&self, query: &Query) -> Result<DnsMessage, ResolveError>;
}

/// Plain DNS over UDP with a per-call timeout.
pub struct UdpResolver {
    upstream: SocketAddr,
    timeout: Duration,
    retries: u8,
    port: u16,
}

impl UdpResolver {
    pub fn new(cfg: &Config) -> Self {
        Self {
            upstream: cfg.upstream,
            timeout: cfg.timeout,
            retries: cfg.retries,
            port: DNS_PORT,
        }
    }

    /// Port used for directly targeted servers.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn server_socket(&self, server: &ServerAddr) -> Result<SocketAddr, ResolveError> {
        let host = match server {
            ServerAddr::Ip(ip) => return Ok(SocketAddr::new(*ip, self.port)),
            ServerAddr::Host(host) => host.trim_end_matches('.'),
        };

        let lookup = tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, self.port)));
        let addrs: Vec<SocketAddr> = match lookup.await {
            Ok(Ok(addrs)) => addrs.collect(),
            Ok(Err(e)) => {
                debug!("address lookup for {host} failed: {e}");
                Vec::new()
            }
            Err(_) => {
                return Err(ResolveError::Timeout {
                    server: host.to_string(),
                });
            }
        };

        // Prefer IPv4; plenty of scanning hosts have no v6 route.
        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ResolveError::NoAddress(host.to_string()))
    }
}

#[async_trait]
impl DnsResolver for UdpResolver {
    async fn query(&self, query: &Query) -> Result<DnsMessage, ResolveError> {
        let addr = match &query.server {
            Some(server) => self.server_socket(server).await?,
            None => self.upstream,
        };

        let attempts = u32::from(self.retries) + 1;
        for attempt in 1..=attempts {
            let id: u16 = rand::random();
            let payload = dns::build_query(id, &query.name, query.record_type, query.recursion)
                .map_err(|e| ResolveError::Encode(e.to_string()))?;

            match udp::exchange(addr, &payload, id, self.timeout).await {
                Ok(bytes) => {
                    return dns::parse_message(&bytes).map_err(|e| ResolveError::Malformed {
                        server: addr.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(ExchangeError::Timeout(_)) if attempt < attempts => {
                    debug!("{} {:?} timed out at {addr}, attempt {attempt}/{attempts}", query.name, query.record_type);
                }
                Err(e) => return Err(map_exchange_error(addr, e)),
            }
        }

        Err(ResolveError::Timeout {
            server: addr.to_string(),
        })
    }
}

fn map_exchange_error(addr: SocketAddr, err: ExchangeError) -> ResolveError {
    let server = addr.to_string();
    if err.is_unreachable() {
        return ResolveError::Unreachable {
            server,
            reason: err.to_string(),
        };
    }
    match err {
        ExchangeError::Timeout(_) => ResolveError::Timeout { server },
        ExchangeError::Io { source, .. } => ResolveError::Transport {
            server,
            reason: source.to_string(),
        },
    }
}
