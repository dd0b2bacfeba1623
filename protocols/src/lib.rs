//! Wire-level DNS plumbing: query encoding, response decoding and the UDP
//! request/response exchange.

pub mod dns;
pub mod udp;
