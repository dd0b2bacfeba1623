use thiserror::Error;

/// Failure of a single resolver exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("timed out waiting for {server}")]
    Timeout { server: String },
    #[error("{server} is unreachable: {reason}")]
    Unreachable { server: String, reason: String },
    #[error("no address found for {0}")]
    NoAddress(String),
    #[error("transport error with {server}: {reason}")]
    Transport { server: String, reason: String },
    #[error("malformed response from {server}: {reason}")]
    Malformed { server: String, reason: String },
    #[error("cannot encode query: {0}")]
    Encode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("nameserver discovery failed: {0}")]
    DiscoveryFailed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe failed: {0}")]
    ProbeFailed(String),
}
