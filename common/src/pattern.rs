//! # Provider Patterns
//!
//! The ordered trust registry that decides whether a nameserver is worth
//! probing. Patterns are either a leading-wildcard suffix (`*.example.com.`)
//! or an exact FQDN. Evaluation is first-match-wins in list order.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::{NameserverRecord, normalize_hostname};
use crate::provider::ProviderTable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `line` is set when the pattern came from a pattern file.
    #[error("{}malformed pattern {pattern:?}: {reason}", line_prefix(.line))]
    MalformedPattern {
        pattern: String,
        reason: &'static str,
        line: Option<usize>,
    },
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|n| format!("line {n}: ")).unwrap_or_default()
}

impl PatternError {
    fn at_line(self, line_no: usize) -> Self {
        match self {
            PatternError::MalformedPattern { pattern, reason, .. } => PatternError::MalformedPattern {
                pattern,
                reason,
                line: Some(line_no),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderPattern {
    /// Matches any hostname strictly below `suffix`, never `suffix` itself.
    Wildcard { suffix: String },
    /// Matches only the identical normalized hostname.
    Exact { value: String },
}

impl ProviderPattern {
    pub fn matches(&self, nameserver: &NameserverRecord) -> bool {
        let host = nameserver.as_str();
        match self {
            ProviderPattern::Exact { value } => host == value,
            ProviderPattern::Wildcard { suffix } => {
                host.len() > suffix.len()
                    && host.ends_with(suffix.as_str())
                    && host.as_bytes()[host.len() - suffix.len() - 1] == b'.'
            }
        }
    }
}

impl FromStr for ProviderPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| PatternError::MalformedPattern {
            pattern: s.to_string(),
            reason,
            line: None,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(malformed("empty pattern"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(malformed("contains whitespace"));
        }

        let (is_wildcard, body) = match trimmed.strip_prefix("*.") {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.contains('*') {
            return Err(malformed("wildcard is only allowed as a leading `*.` label"));
        }

        let name = normalize_hostname(body).ok_or_else(|| malformed("no labels"))?;
        if name.trim_end_matches('.').split('.').any(str::is_empty) {
            return Err(malformed("empty label"));
        }

        Ok(if is_wildcard {
            ProviderPattern::Wildcard { suffix: name }
        } else {
            ProviderPattern::Exact { value: name }
        })
    }
}

impl fmt::Display for ProviderPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderPattern::Wildcard { suffix } => write!(f, "*.{suffix}"),
            ProviderPattern::Exact { value } => f.write_str(value),
        }
    }
}

/// A pattern together with the provider label it reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternRule {
    pub pattern: ProviderPattern,
    pub label: String,
}

/// Ordered list of [`PatternRule`]s. Order is precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

/// The nameservers the scanner watches when no pattern file is given.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("*.orangehost.com.", "Orange DNS"),
    ("*.orangehost.net.", "Orange DNS"),
    ("ns1.orangehost.com.", "Orange DNS"),
    ("ns2.orangehost.com.", "Orange DNS"),
];

impl PatternRegistry {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Validates `{pattern, providerLabel}` pairs in order.
    ///
    /// The first malformed entry aborts the whole load.
    pub fn from_entries<I, P, L>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (P, L)>,
        P: AsRef<str>,
        L: Into<String>,
    {
        let rules = entries
            .into_iter()
            .map(|(pattern, label)| -> Result<PatternRule, PatternError> {
                Ok(PatternRule {
                    pattern: pattern.as_ref().parse()?,
                    label: label.into(),
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { rules })
    }

    /// Parses the pattern-file format: `<pattern> <label...>` per line.
    ///
    /// Blank lines and `#` comments are skipped. A line without a label takes
    /// the cosmetic classification of the pattern text.
    pub fn from_config_text(text: &str, table: &ProviderTable) -> Result<Self, PatternError> {
        let mut rules = Vec::new();
        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (pattern_text, label) = match line.split_once(char::is_whitespace) {
                Some((pattern, label)) => (pattern, label.trim().to_string()),
                None => (line, String::new()),
            };
            let pattern: ProviderPattern = pattern_text
                .parse()
                .map_err(|e: PatternError| e.at_line(idx + 1))?;
            let label = if label.is_empty() {
                table.classify(pattern_text).to_string()
            } else {
                label
            };
            rules.push(PatternRule { pattern, label });
        }
        Ok(Self { rules })
    }

    pub fn builtin() -> Self {
        let rules = BUILTIN_PATTERNS
            .iter()
            .filter_map(|(pattern, label)| {
                pattern.parse().ok().map(|pattern| PatternRule {
                    pattern,
                    label: label.to_string(),
                })
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
