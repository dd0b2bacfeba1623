//! The delegation-integrity pipeline.
//!
//! [`discovery`] finds the delegated nameservers, [`fingerprint`] decides which
//! of them are watched, [`probe`] asks them directly whether they still serve
//! the zone and [`scanner`] ties the stages together over many domains.

pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod probe;
pub mod resolver;
pub mod scanner;
