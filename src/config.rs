use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::oauth::Credentials;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cache_path: PathBuf,
    pub request_delay_ms: u64,
    pub nearby: NearbyConfig,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NearbyConfig {
    pub endpoint: String,
    pub radius: u32,
    pub max_matches: u32,
    pub ambiguities: String,
    pub out_format: String,
    pub cache_key: NearbyCacheKey,
}

/// What the nearby-search response is cached under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearbyCacheKey {
    /// Site name only. Two sites sharing a name share one cached response.
    #[default]
    Name,
    NameAndPostalCode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.nps.gov".to_string(),
            cache_path: PathBuf::from("NationalSite_cache.json"),
            request_delay_ms: 1000,
            nearby: NearbyConfig::default(),
            credentials: None,
        }
    }
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://www.mapquestapi.com/search/v2/radius".to_string(),
            radius: 10,
            max_matches: 10,
            ambiguities: "ignore".to_string(),
            out_format: "json".to_string(),
            cache_key: NearbyCacheKey::Name,
        }
    }
}

impl Config {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Config> {
    let text = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&text)?;
    Ok(config)
}
