//! # Nameserver Discovery
//!
//! Finds the nameservers currently delegated for a domain, either with one NS
//! query through the upstream resolver ([`DiscoveryMode::Direct`]) or by
//! walking the referral chain down from the root ([`DiscoveryMode::Trace`]).
//!
//! Both modes return normalized, de-duplicated names in discovery order. An
//! empty list means "no delegation" and is never an error.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use tracing::debug;

use dangle_common::{
    config::DiscoveryMode,
    domain::{Domain, NameserverRecord, is_within_zone, label_count},
};
use dangle_protocols::dns::{DnsMessage, Rcode, Record, RecordType};

use crate::error::DiscoveryError;
use crate::resolver::{DnsResolver, Query, ServerAddr};

const MAX_REFERRALS: usize = 16;
const MAX_SERVERS_PER_ZONE: usize = 3;

const ROOT_SERVERS: [Ipv4Addr; 13] = [
    Ipv4Addr::new(198, 41, 0, 4),
    Ipv4Addr::new(170, 247, 170, 2),
    Ipv4Addr::new(192, 33, 4, 12),
    Ipv4Addr::new(199, 7, 91, 13),
    Ipv4Addr::new(192, 203, 230, 10),
    Ipv4Addr::new(192, 5, 5, 241),
    Ipv4Addr::new(192, 112, 36, 4),
    Ipv4Addr::new(198, 97, 190, 53),
    Ipv4Addr::new(192, 36, 148, 17),
    Ipv4Addr::new(192, 58, 128, 30),
    Ipv4Addr::new(193, 0, 14, 129),
    Ipv4Addr::new(199, 7, 83, 42),
    Ipv4Addr::new(202, 12, 27, 33),
];

pub struct NameserverDiscovery {
    resolver: Arc<dyn DnsResolver>,
    mode: DiscoveryMode,
    roots: Vec<ServerAddr>,
}

impl NameserverDiscovery {
    pub fn new(resolver: Arc<dyn DnsResolver>, mode: DiscoveryMode) -> Self {
        // Spread load across the root letters between runs.
        let mut roots: Vec<ServerAddr> = ROOT_SERVERS
            .iter()
            .map(|ip| ServerAddr::Ip(IpAddr::V4(*ip)))
            .collect();
        roots.rotate_left(rand::random_range(0..ROOT_SERVERS.len()));
        Self {
            resolver,
            mode,
            roots,
        }
    }

    /// Replaces the root server set trace mode starts from.
    pub fn with_roots(mut self, roots: Vec<ServerAddr>) -> Self {
        self.roots = roots;
        self
    }

    pub async fn discover(&self, domain: &Domain) -> Result<Vec<NameserverRecord>, DiscoveryError> {
        let nameservers = match self.mode {
            DiscoveryMode::Direct => self.discover_direct(domain).await?,
            DiscoveryMode::Trace => self.discover_trace(domain).await?,
        };
        debug!("{domain}: {} nameserver(s) delegated", nameservers.len());
        Ok(nameservers)
    }

    async fn discover_direct(&self, domain: &Domain) -> Result<Vec<NameserverRecord>, DiscoveryError> {
        let query = Query::new(domain.fqdn(), RecordType::NS);
        let msg = self
            .resolver
            .query(&query)
            .await
            .map_err(|e| DiscoveryError::DiscoveryFailed(e.to_string()))?;

        // A truncated answer section cannot tell "no delegation" from "cut short".
        if msg.truncated {
            return Err(DiscoveryError::DiscoveryFailed(format!(
                "truncated response from upstream resolver for {domain}"
            )));
        }

        match msg.rcode {
            Rcode::NoError => {}
            Rcode::NXDomain => return Ok(Vec::new()),
            other => {
                return Err(DiscoveryError::DiscoveryFailed(format!(
                    "upstream resolver answered {other} for {domain}"
                )));
            }
        }

        let mut found = Vec::new();
        collect_exact(&mut found, &msg.answers, &domain.fqdn());
        Ok(found)
    }

    async fn discover_trace(&self, domain: &Domain) -> Result<Vec<NameserverRecord>, DiscoveryError> {
        let target = domain.fqdn();
        let mut found = Vec::new();
        let mut zone = String::from(".");
        let mut servers = self.roots.clone();

        for _ in 0..MAX_REFERRALS {
            let msg = self.ask_zone(&zone, &servers, &target).await?;
            if msg.rcode == Rcode::NXDomain {
                break;
            }

            let before = found.len();
            collect_exact(&mut found, &msg.answers, &target);
            if found.len() > before {
                break;
            }

            let Some((child, next_servers)) = referral(&msg, &zone, &target) else {
                break;
            };
            debug!("{domain}: {zone} refers to {child}");

            if child == target {
                collect_exact(&mut found, &msg.authorities, &target);
                // The child may list more servers than the parent; a dead child is the
                // very thing being scanned for, so its failure is not fatal.
                match self.ask_zone(&child, &next_servers, &target).await {
                    Ok(answer) => {
                        collect_exact(&mut found, &answer.answers, &target);
                        collect_exact(&mut found, &answer.authorities, &target);
                    }
                    Err(e) => debug!("{domain}: child zone did not confirm delegation: {e}"),
                }
                return Ok(found);
            }

            zone = child;
            servers = next_servers;
        }

        if found.is_empty() && zone != target {
            debug!("{domain}: no delegation below {zone}");
        }
        Ok(found)
    }

    /// Asks up to [`MAX_SERVERS_PER_ZONE`] servers of `zone` until one gives a usable answer.
    async fn ask_zone(
        &self,
        zone: &str,
        servers: &[ServerAddr],
        target: &str,
    ) -> Result<DnsMessage, DiscoveryError> {
        let mut last_failure = String::from("no servers known");
        for server in servers.iter().take(MAX_SERVERS_PER_ZONE) {
            let query = Query::new(target, RecordType::NS).to_server(server.clone());
            match self.resolver.query(&query).await {
                Ok(msg) if msg.truncated => {
                    debug!("{server} ({zone}) sent a truncated answer for {target}");
                    last_failure = format!("truncated response from {server}");
                }
                Ok(msg) if matches!(msg.rcode, Rcode::NoError | Rcode::NXDomain) => return Ok(msg),
                Ok(msg) => {
                    debug!("{server} ({zone}) answered {} for {target}", msg.rcode);
                    last_failure = format!("{server} answered {}", msg.rcode);
                }
                Err(e) => {
                    debug!("{server} ({zone}) failed for {target}: {e}");
                    last_failure = e.to_string();
                }
            }
        }
        debug!("no server for zone {zone} answered the {target} NS query");
        Err(DiscoveryError::DiscoveryFailed(format!(
            "no server for zone {zone} answered: {last_failure}"
        )))
    }
}

/// Appends NS targets owned by exactly `owner`, skipping blanks and duplicates.
fn collect_exact(found: &mut Vec<NameserverRecord>, records: &[Record], owner: &str) {
    for (name, target) in DnsMessage::ns_pairs(records) {
        if name != owner {
            continue;
        }
        if let Some(ns) = NameserverRecord::new(target)
            && !found.contains(&ns)
        {
            found.push(ns);
        }
    }
}

/// Picks the delegation in `msg` that moves closer to `target` than `zone`.
///
/// Returns the child zone and the servers to ask next, glue addresses first.
fn referral(msg: &DnsMessage, zone: &str, target: &str) -> Option<(String, Vec<ServerAddr>)> {
    let child = DnsMessage::ns_pairs(&msg.authorities)
        .map(|(owner, _)| owner)
        .filter(|owner| {
            is_within_zone(target, owner)
                && is_within_zone(owner, zone)
                && label_count(owner) > label_count(zone)
        })
        .max_by_key(|owner| label_count(owner))?
        .to_string();

    let mut glued = Vec::new();
    let mut unglued = Vec::new();
    for (owner, host) in DnsMessage::ns_pairs(&msg.authorities) {
        if owner != child {
            continue;
        }
        match msg.glue_for(host).first() {
            Some(ip) => glued.push(ServerAddr::Ip(*ip)),
            None => unglued.push(ServerAddr::Host(host.to_string())),
        }
    }
    glued.extend(unglued);
    Some((child, glued))
}
