mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Context;
use clap::Parser;
use verdict_logging::{verdict_debug, verdict_info};

use cli::Cli;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = config::load(cli.overrides.config.as_deref())
        .and_then(|file| file.resolve(&cli.overrides))
        .context("loading settings")?;

    logging::initialize(cli.log_to, settings.log_level);
    verdict_info!(
        "verdict {} starting against {}",
        env!("CARGO_PKG_VERSION"),
        settings.client.base_url
    );
    verdict_debug!(
        "Poll every {:?}, fallback {}",
        settings.poll.interval,
        if settings.fallback.enabled { "on" } else { "off" }
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(commands::execute(cli.command, settings))
}
