use dangle_common::{config::Config, pattern::PatternRegistry};

use crate::terminal::print;

pub fn show(registry: &PatternRegistry, cfg: &Config) {
    print::header("provider patterns", cfg.quiet);

    if registry.is_empty() {
        print::print_status("No patterns loaded, nothing would be probed");
        return;
    }

    let width = registry
        .rules()
        .iter()
        .map(|rule| rule.pattern.to_string().len())
        .max()
        .unwrap_or(0);

    // First match wins, so the position is part of the meaning.
    for (idx, rule) in registry.rules().iter().enumerate() {
        let key = format!("{:>2} {}", idx + 1, rule.pattern);
        print::aligned_line(&key, rule.label.as_str(), width + 3);
    }
    print::end_of_program(cfg.quiet);
}
