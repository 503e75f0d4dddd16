//! cli entrypoint for vantage.

mod app;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// main entrypoint for the async cli.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    app::run(app::Cli::parse()).await
}
