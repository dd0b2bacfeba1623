//! # Provider Fingerprinting
//!
//! Two deliberately separate lookups:
//! * [`match_trusted`] walks the ordered trust registry and gates probing.
//! * [`ProviderFingerprint::classify_provider`] names the provider for reports only.

use dangle_common::{
    domain::NameserverRecord,
    pattern::{PatternRegistry, PatternRule},
    provider::ProviderTable,
};

/// Label of the first rule whose pattern matches `nameserver`.
pub fn match_trusted<'a>(nameserver: &NameserverRecord, rules: &'a [PatternRule]) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| rule.pattern.matches(nameserver))
        .map(|rule| rule.label.as_str())
}

pub struct ProviderFingerprint {
    registry: PatternRegistry,
    table: ProviderTable,
}

impl ProviderFingerprint {
    pub fn new(registry: PatternRegistry, table: ProviderTable) -> Self {
        Self { registry, table }
    }

    pub fn match_trusted(&self, nameserver: &NameserverRecord) -> Option<&str> {
        match_trusted(nameserver, self.registry.rules())
    }

    pub fn classify_provider(&self, nameserver: &NameserverRecord) -> &str {
        self.table.classify(nameserver.as_str())
    }
}
