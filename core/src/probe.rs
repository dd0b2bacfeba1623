//! # Delegation Probe
//!
//! Asks a delegated nameserver directly, without recursion, whether it still
//! serves the zone. Only the response code matters:
//!
//! | response            | meaning                         |
//! |---------------------|---------------------------------|
//! | NOERROR, NXDOMAIN   | zone is managed, no risk        |
//! | SERVFAIL, REFUSED   | dangling-delegation risk signal |
//! | no exchange         | inconclusive                    |

use std::sync::Arc;

use tracing::debug;

use dangle_common::{
    domain::{Domain, NameserverRecord},
    scan::ProbeStatus,
};
use dangle_protocols::dns::{DnsMessage, Rcode, RecordType};

use crate::error::{ProbeError, ResolveError};
use crate::resolver::{DnsResolver, Query, ServerAddr};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    /// The decoded response, kept for diagnostics. `None` when unreachable.
    pub response: Option<DnsMessage>,
}

pub struct DelegationProbe {
    resolver: Arc<dyn DnsResolver>,
}

impl DelegationProbe {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }

    pub async fn probe(&self, domain: &Domain, nameserver: &NameserverRecord) -> Result<ProbeResult, ProbeError> {
        let query = Query::new(domain.fqdn(), RecordType::A).to_server(ServerAddr::Host(nameserver.to_string()));

        match self.resolver.query(&query).await {
            Ok(msg) => {
                let status = classify_rcode(msg.rcode);
                debug!("{nameserver} answered {} for {domain} ({status})", msg.rcode);
                Ok(ProbeResult {
                    status,
                    response: Some(msg),
                })
            }
            Err(ResolveError::NoAddress(_) | ResolveError::Unreachable { .. }) => Ok(ProbeResult {
                status: ProbeStatus::Unreachable,
                response: None,
            }),
            Err(e) => Err(ProbeError::ProbeFailed(e.to_string())),
        }
    }
}

/// Maps a response code onto a [`ProbeStatus`].
///
/// FORMERR, NOTIMP and reserved codes are answers from a live server and carry no risk.
pub fn classify_rcode(rcode: Rcode) -> ProbeStatus {
    match rcode {
        Rcode::ServFail => ProbeStatus::ServFail,
        Rcode::Refused => ProbeStatus::Refused,
        Rcode::NXDomain => ProbeStatus::NXDomain,
        Rcode::NoError | Rcode::FormErr | Rcode::NotImp | Rcode::Other(_) => ProbeStatus::Answered,
    }
}
