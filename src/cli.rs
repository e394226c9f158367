use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::Config;
use crate::oauth::Credentials;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("--api-key and --api-secret must be given together")]
    PartialCredentials,
}

/// Browse national sites by state and look up places nearby
#[derive(Parser, Debug)]
#[command(name = "nps_crawler")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache document to read and write
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Pause before each uncached page fetch, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Nearby-search API key
    #[arg(long, env = "MAPQUEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Nearby-search API secret
    #[arg(long, env = "MAPQUEST_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn apply(&self, config: &mut Config) -> Result<(), CliError> {
        if let Some(cache) = &self.cache {
            config.cache_path = cache.clone();
        }
        if let Some(delay) = self.delay_ms {
            config.request_delay_ms = delay;
        }

        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => {
                config.credentials = Some(Credentials::new(key.clone(), secret.clone()));
            }
            (None, None) => {}
            _ => return Err(CliError::PartialCredentials),
        }

        Ok(())
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
