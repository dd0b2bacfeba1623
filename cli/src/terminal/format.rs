use colored::*;

use dangle_common::{provider::UNKNOWN_PROVIDER, scan::Finding};

use crate::terminal::colors;

type Detail = (String, ColoredString);

pub fn finding_to_details(finding: &Finding) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("NS".to_string(), finding.nameserver.as_str().color(colors::NAMESERVER)),
        ("Match".to_string(), finding.provider.as_str().color(colors::TEXT_DEFAULT)),
    ];

    // The cosmetic label only adds something when it is known.
    if finding.classified_provider != UNKNOWN_PROVIDER {
        details.push(("Host".to_string(), finding.classified_provider.as_str().color(colors::ACCENT)));
    }

    details.push(("Status".to_string(), finding.status.to_string().color(colors::RISK).bold()));
    details.push(("Risk".to_string(), finding.risk.to_string().color(colors::RISK)));
    details
}

/// Single-line form for the quietest output level.
pub fn finding_line(finding: &Finding) -> String {
    format!(
        "{} {} {} ({})",
        finding.domain.as_str().color(colors::PRIMARY),
        finding.nameserver.as_str().color(colors::NAMESERVER),
        finding.status.to_string().color(colors::RISK).bold(),
        finding.provider,
    )
}
