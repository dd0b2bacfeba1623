//! Test doubles shared by the integration tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dangle_common::domain::normalize_hostname;
use dangle_core::error::ResolveError;
use dangle_core::resolver::{DnsResolver, Query, ServerAddr};
use dangle_core::scanner::CancelToken;
use dangle_protocols::dns::{DnsMessage, Rcode, Record, RecordType};

/// Answers NS queries from a delegation table and direct A probes from a
/// per-nameserver table. Anything unlisted answers NOERROR with no records.
#[derive(Default)]
pub struct FakeResolver {
    delegations: HashMap<String, Vec<String>>,
    probes: HashMap<(String, String), Result<Rcode, ResolveError>>,
    delays: HashMap<String, Duration>,
    cancel_on_probe: Mutex<Option<(String, CancelToken)>>,
    pub queries: Mutex<Vec<Query>>,
}

fn key(name: &str) -> String {
    normalize_hostname(name).unwrap_or_default()
}

impl FakeResolver {
    pub fn delegate(mut self, domain: &str, nameservers: &[&str]) -> Self {
        let nameservers = nameservers.iter().map(|ns| ns.to_string()).collect();
        self.delegations.insert(key(domain), nameservers);
        self
    }

    pub fn probe(mut self, nameserver: &str, domain: &str, rcode: Rcode) -> Self {
        self.probes.insert((key(nameserver), key(domain)), Ok(rcode));
        self
    }

    pub fn fail_probe(mut self, nameserver: &str, domain: &str, err: ResolveError) -> Self {
        self.probes.insert((key(nameserver), key(domain)), Err(err));
        self
    }

    /// Delays every answer about `domain`, to shuffle completion order.
    pub fn delay(mut self, domain: &str, delay: Duration) -> Self {
        self.delays.insert(key(domain), delay);
        self
    }

    /// Cancels `token` while answering the first probe about `domain`.
    pub fn cancel_when_probed(&self, domain: &str, token: CancelToken) {
        if let Ok(mut slot) = self.cancel_on_probe.lock() {
            *slot = Some((key(domain), token));
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DnsResolver for FakeResolver {
    async fn query(&self, query: &Query) -> Result<DnsMessage, ResolveError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        let name = key(&query.name);
        if let Some(delay) = self.delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }

        match (&query.server, query.record_type) {
            (None, RecordType::NS) => {
                let mut msg = DnsMessage::with_rcode(Rcode::NoError);
                if let Some(nameservers) = self.delegations.get(&name) {
                    msg.answers = nameservers.iter().map(|ns| Record::ns(&name, ns)).collect();
                }
                Ok(msg)
            }
            (Some(ServerAddr::Host(ns)), RecordType::A) => {
                self.fire_cancel(&name);
                self.probe_answer(ns, name)
            }
            _ => Ok(DnsMessage::with_rcode(Rcode::NoError)),
        }
    }
}

impl FakeResolver {
    fn fire_cancel(&self, name: &str) {
        let Ok(slot) = self.cancel_on_probe.lock() else {
            return;
        };
        if let Some((domain, token)) = slot.as_ref() {
            if domain == name {
                token.cancel();
            }
        }
    }

    fn probe_answer(&self, ns: &str, name: String) -> Result<DnsMessage, ResolveError> {
        match self.probes.get(&(key(ns), name)) {
            Some(Ok(rcode)) => Ok(DnsMessage::with_rcode(*rcode)),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(DnsMessage::with_rcode(Rcode::NoError)),
        }
    }
}

/// Builds a reply to a raw query: the header and question are echoed, the
/// rcode set, and `ns_answers` appended as NS records for the question name.
pub fn reply(query: &[u8], rcode: u8, ns_answers: &[&str]) -> Option<Vec<u8>> {
    let question_end = question_end(query)?;
    let mut out = query[..question_end].to_vec();

    out[2] = 0x84 | (query[2] & 0x01);
    out[3] = rcode & 0x0f;
    out[6..8].copy_from_slice(&(ns_answers.len() as u16).to_be_bytes());
    out[8..12].fill(0);

    for ns in ns_answers {
        let rdata = encode_name(ns);
        out.extend_from_slice(&[0xc0, 0x0c]);
        out.extend_from_slice(&2u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&300u32.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&rdata);
    }
    Some(out)
}

/// Query type of the single question in `query`.
pub fn question_type(query: &[u8]) -> Option<u16> {
    let end = question_end(query)?;
    Some(u16::from_be_bytes([query[end - 4], query[end - 3]]))
}

fn question_end(query: &[u8]) -> Option<usize> {
    let mut cursor = 12;
    loop {
        let len = *query.get(cursor)? as usize;
        cursor += 1;
        if len == 0 {
            break;
        }
        cursor += len;
    }
    let end = cursor + 4;
    (end <= query.len()).then_some(end)
}

fn encode_name(name: &str) -> Vec<u8> {
    let mut encoded = Vec::new();
    for label in name.split('.').filter(|label| !label.is_empty()) {
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}
