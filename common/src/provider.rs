//! Cosmetic provider labels.
//!
//! Purely informational: the table never decides whether a nameserver gets
//! probed, it only names the provider in reports.

pub const UNKNOWN_PROVIDER: &str = "Unknown";

/// A hostname fragment and the provider it identifies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSignature {
    pub fragment: String,
    pub label: String,
}

const DEFAULT_SIGNATURES: &[(&str, &str)] = &[
    ("amazonaws.com", "AWS Route 53"),
    ("awsdns", "AWS Route 53"),
    ("cloudflare.com", "Cloudflare"),
    ("googledomains.com", "Google Cloud DNS"),
    ("google.com", "Google Cloud DNS"),
    ("azure-dns", "Azure DNS"),
    ("orangehost.com", "Orange DNS"),
];

/// Ordered substring table; the first fragment found in the hostname wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderTable {
    signatures: Vec<ProviderSignature>,
}

impl ProviderTable {
    pub fn new(signatures: Vec<ProviderSignature>) -> Self {
        Self { signatures }
    }

    pub fn classify(&self, hostname: &str) -> &str {
        let host = hostname.to_ascii_lowercase();
        self.signatures
            .iter()
            .find(|sig| host.contains(&sig.fragment))
            .map(|sig| sig.label.as_str())
            .unwrap_or(UNKNOWN_PROVIDER)
    }
}

impl Default for ProviderTable {
    fn default() -> Self {
        let signatures = DEFAULT_SIGNATURES
            .iter()
            .map(|(fragment, label)| ProviderSignature {
                fragment: fragment.to_string(),
                label: label.to_string(),
            })
            .collect();
        Self { signatures }
    }
}
