#![forbid(unsafe_code)]

mod cli;
mod support;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TREELOG_LOG";

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}
