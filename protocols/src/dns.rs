use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use dns_parser::{Builder, Packet, QueryClass, QueryType, RData, ResourceRecord, ResponseCode};
use thiserror::Error;

use dangle_common::domain::normalize_hostname;

pub const DNS_HDR_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
/// dns-parser's `Builder::add_question` asserts `part.len() < 63`, one octet short of the wire limit.
const MAX_ENCODABLE_LABEL_LEN: usize = 62;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("cannot encode {name:?}: {reason}")]
    Encode { name: String, reason: &'static str },
    #[error("malformed response: {0}")]
    Parse(#[from] dns_parser::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    NS,
}

impl From<RecordType> for QueryType {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => QueryType::A,
            RecordType::AAAA => QueryType::AAAA,
            RecordType::NS => QueryType::NS,
        }
    }
}

/// Response code of a DNS message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl From<ResponseCode> for Rcode {
    fn from(value: ResponseCode) -> Self {
        match value {
            ResponseCode::NoError => Rcode::NoError,
            ResponseCode::FormatError => Rcode::FormErr,
            ResponseCode::ServerFailure => Rcode::ServFail,
            ResponseCode::NameError => Rcode::NXDomain,
            ResponseCode::NotImplemented => Rcode::NotImp,
            ResponseCode::Refused => Rcode::Refused,
            ResponseCode::Reserved(code) => Rcode::Other(code),
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => f.write_str("NOERROR"),
            Rcode::FormErr => f.write_str("FORMERR"),
            Rcode::ServFail => f.write_str("SERVFAIL"),
            Rcode::NXDomain => f.write_str("NXDOMAIN"),
            Rcode::NotImp => f.write_str("NOTIMP"),
            Rcode::Refused => f.write_str("REFUSED"),
            Rcode::Other(code) => write!(f, "RCODE{code}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordData {
    Ns(String),
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Other,
}

/// A resource record with its owner normalized to trailing-dot form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub data: RecordData,
}

impl Record {
    pub fn ns(owner: &str, target: &str) -> Self {
        Self {
            name: normalize_hostname(owner).unwrap_or_else(|| ".".to_string()),
            data: RecordData::Ns(target.to_string()),
        }
    }

    pub fn address(owner: &str, addr: IpAddr) -> Self {
        let data = match addr {
            IpAddr::V4(v4) => RecordData::A(v4),
            IpAddr::V6(v6) => RecordData::Aaaa(v6),
        };
        Self {
            name: normalize_hostname(owner).unwrap_or_else(|| ".".to_string()),
            data,
        }
    }
}

/// A decoded DNS response. `raw` keeps the wire bytes for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsMessage {
    pub id: u16,
    pub rcode: Rcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
    pub raw: Vec<u8>,
}

impl DnsMessage {
    /// An empty response carrying only `rcode`.
    pub fn with_rcode(rcode: Rcode) -> Self {
        Self {
            id: 0,
            rcode,
            authoritative: false,
            truncated: false,
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// `(owner, nameserver)` pairs for every NS record in `records`.
    pub fn ns_pairs(records: &[Record]) -> impl Iterator<Item = (&str, &str)> {
        records.iter().filter_map(|record| match &record.data {
            RecordData::Ns(target) => Some((record.name.as_str(), target.as_str())),
            _ => None,
        })
    }

    /// Glue addresses from the additional section for `host`.
    pub fn glue_for(&self, host: &str) -> Vec<IpAddr> {
        let Some(host) = normalize_hostname(host) else {
            return Vec::new();
        };
        self.additionals
            .iter()
            .filter(|record| record.name == host)
            .filter_map(|record| match record.data {
                RecordData::A(v4) => Some(IpAddr::V4(v4)),
                RecordData::Aaaa(v6) => Some(IpAddr::V6(v6)),
                _ => None,
            })
            .collect()
    }
}

/// Encodes a single-question query for `name`.
pub fn build_query(id: u16, name: &str, rtype: RecordType, recursion: bool) -> Result<Vec<u8>, DnsError> {
    let encode_err = |reason| DnsError::Encode {
        name: name.to_string(),
        reason,
    };
    // dns-parser writes every dot-separated part as a label, so the root dot must go.
    let qname = name.trim().trim_end_matches('.');
    if qname.is_empty() {
        return Err(encode_err("empty name"));
    }
    for label in qname.split('.') {
        if label.is_empty() {
            return Err(encode_err("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(encode_err("label longer than 63 octets"));
        }
        if label.len() > MAX_ENCODABLE_LABEL_LEN {
            return Err(encode_err("63-octet labels are not supported by the query encoder"));
        }
    }

    let mut builder = Builder::new_query(id, recursion);
    builder.add_question(qname, false, rtype.into(), QueryClass::IN);
    builder.build().map_err(|_| encode_err("query exceeds 512 bytes"))
}

pub fn parse_message(bytes: &[u8]) -> Result<DnsMessage, DnsError> {
    let packet = Packet::parse(bytes)?;
    Ok(DnsMessage {
        id: packet.header.id,
        rcode: packet.header.response_code.into(),
        authoritative: packet.header.authoritative,
        truncated: packet.header.truncated,
        answers: packet.answers.iter().map(convert_record).collect(),
        authorities: packet.nameservers.iter().map(convert_record).collect(),
        additionals: packet.additional.iter().map(convert_record).collect(),
        raw: bytes.to_vec(),
    })
}

/// Reads the transaction id without decoding the rest of the message.
pub fn peek_id(bytes: &[u8]) -> Option<u16> {
    if bytes.len() < DNS_HDR_LEN {
        return None;
    }
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// True when the header's QR bit marks `bytes` as a response.
pub fn is_response(bytes: &[u8]) -> bool {
    bytes.len() >= DNS_HDR_LEN && bytes[2] & 0x80 != 0
}

fn convert_record(record: &ResourceRecord) -> Record {
    let name = normalize_hostname(&record.name.to_string()).unwrap_or_else(|| ".".to_string());
    let data = match &record.data {
        RData::NS(ns) => RecordData::Ns(ns.0.to_string()),
        RData::A(a) => RecordData::A(a.0),
        RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
        _ => RecordData::Other,
    };
    Record { name, data }
}
