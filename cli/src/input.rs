//! Reading the domain list and the provider pattern file.

use std::fs;
use std::path::Path;

use anyhow::Context;
use dangle_common::{
    domain::Domain,
    pattern::PatternRegistry,
    provider::ProviderTable,
    success, warn,
};

/// One domain per line; blank lines and `#` comments are skipped.
///
/// Unparseable lines are reported and skipped, not fatal.
pub fn read_domains(path: &Path) -> anyhow::Result<Vec<Domain>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading domain list {}", path.display()))?;
    let domains = parse_domains(&text);

    let len = domains.len();
    let unit = if len == 1 { "domain" } else { "domains" };
    success!("{len} {unit} loaded from {}", path.display());
    Ok(domains)
}

fn parse_domains(text: &str) -> Vec<Domain> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.parse::<Domain>() {
                Ok(domain) => Some(domain),
                Err(e) => {
                    warn!("line {}: {e}", idx + 1);
                    None
                }
            }
        })
        .collect()
}

/// Loads the pattern file, or the built-in registry when none is given.
pub fn load_patterns(path: Option<&Path>) -> anyhow::Result<PatternRegistry> {
    let Some(path) = path else {
        return Ok(PatternRegistry::builtin());
    };

    let text = fs::read_to_string(path).with_context(|| format!("reading pattern file {}", path.display()))?;
    let registry = PatternRegistry::from_config_text(&text, &ProviderTable::default())
        .with_context(|| format!("loading patterns from {}", path.display()))?;

    if registry.is_empty() {
        warn!("{} contains no patterns, nothing will be probed", path.display());
    }
    Ok(registry)
}
