use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nps_crawler::cli::Cli;
use nps_crawler::config::{self, Config};
use nps_crawler::{HttpFetcher, ResponseCache, Resolver, session};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config)?;

    let mut cache = if cli.no_cache {
        ResponseCache::in_memory()
    } else {
        ResponseCache::load(&config.cache_path)
    };

    info!(base_url = %config.base_url, "crawler started");

    let fetcher = HttpFetcher::new();
    let resolver = Resolver::new(&fetcher, &config)?;

    let stdin = io::stdin();
    session::run(&resolver, &mut cache, stdin.lock(), io::stdout()).await?;

    info!(entries = cache.len(), "crawler finished");

    Ok(())
}
