use anyhow::Result;
use clap::Parser;
use selfhost_fonts::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --log-level takes precedence over DEBUG_LEVEL
    selfhost_fonts::debug::init_log_bridge(cli.log_level.map(Into::into));

    log::debug!("Starting selfhost-fonts {}", selfhost_fonts::VERSION);

    let result = cli::run(cli);
    if let Err(ref e) = result {
        log::error!("{e:#}");
    }
    result
}
