mod commands;
mod input;
mod terminal;

use commands::{CommandLine, Commands, check, patterns, scan};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    let cfg = commands.to_config();
    print::banner(cfg.no_banner, cfg.quiet);

    // A broken pattern list aborts before any domain is touched.
    let registry = input::load_patterns(commands.patterns.as_deref())?;

    match commands.command {
        Commands::Scan { file } => {
            print::header("loading domains", cfg.quiet);
            let domains = input::read_domains(&file)?;
            scan::scan(domains, registry, &cfg).await
        }
        Commands::Check { domain } => check::check(domain, registry, &cfg).await,
        Commands::Patterns => {
            patterns::show(&registry, &cfg);
            Ok(())
        }
    }
}
