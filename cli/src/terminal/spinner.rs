use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use dangle_common::domain::Domain;

use crate::terminal::colors;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn scan_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} [{pos}/{len}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// Attaches the scan spinner to `span`; it shows once the span is entered.
pub fn start_scan_progress(span: &Span, total: usize) {
    span.pb_set_style(&scan_style());
    span.pb_set_length(total as u64);
    span.pb_set_message("Resolving delegations...");
}

pub fn report_scan_progress(span: &Span, domain: &Domain, done: usize) {
    span.pb_set_position(done as u64);
    span.pb_set_message(
        &format!("Last checked {}", domain.as_str().green().bold())
            .color(colors::TEXT_DEFAULT)
            .to_string(),
    );
}
