use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheError, ResponseCache};
use crate::config::{Config, NearbyCacheKey};
use crate::extract::{self, DETAIL_PROFILE, DIRECTORY_PROFILE, ExtractError, LISTING_PROFILE};
use crate::fetch::{FetchError, Fetcher};
use crate::oauth::Credentials;
use crate::site::{NearbyRecord, SearchResult, SiteRecord};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("invalid base url {url}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("nearby search needs an API key and secret")]
    MissingCredentials,
    #[error("unexpected nearby-search response for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "searchResults")]
    search_results: Option<Vec<SearchResult>>,
}

/// Every call goes through the cache handed in by the caller.
pub struct Resolver<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    config: &'a Config,
    base: Url,
}

impl<'a, F: Fetcher + ?Sized> Resolver<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a Config) -> Result<Self, CrawlError> {
        let base = Url::parse(&config.base_url).map_err(|source| CrawlError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            fetcher,
            config,
            base,
        })
    }

    pub async fn build_directory(
        &self,
        cache: &mut ResponseCache,
    ) -> Result<BTreeMap<String, String>, CrawlError> {
        let body = self.fetch_page(cache, &self.config.base_url).await?;
        let entries = extract::extract_directory(&body, &self.base, &DIRECTORY_PROFILE)?;

        info!(states = entries.len(), "directory built");

        Ok(entries.into_iter().collect())
    }

    pub async fn resolve_site(
        &self,
        cache: &mut ResponseCache,
        url: &str,
    ) -> Result<SiteRecord, CrawlError> {
        let body = self.fetch_page(cache, url).await?;
        let fields = extract::extract_detail(&body, DETAIL_PROFILE)?;

        Ok(SiteRecord::from_detail(fields))
    }

    /// Sites of one state, in the order the state page lists them.
    pub async fn resolve_region(
        &self,
        cache: &mut ResponseCache,
        url: &str,
    ) -> Result<Vec<SiteRecord>, CrawlError> {
        let body = self.fetch_page(cache, url).await?;
        let links = extract::extract_listing(&body, &self.base, &LISTING_PROFILE)?;

        info!(url, sites = links.len(), "resolving state");

        let mut sites = Vec::with_capacity(links.len());
        for link in &links {
            sites.push(self.resolve_site(cache, link).await?);
        }

        Ok(sites)
    }

    pub async fn resolve_nearby(
        &self,
        cache: &mut ResponseCache,
        site: &SiteRecord,
    ) -> Result<Vec<NearbyRecord>, CrawlError> {
        let key = self.nearby_key(site);
        let credentials = self.config.credentials.as_ref();
        let endpoint = self.config.nearby.endpoint.as_str();
        let key_ref = key.as_str();

        // An entry from an older or foreign document counts as a miss
        if cache
            .get(&key)
            .is_some_and(|cached| SearchResponse::deserialize(cached).is_err())
        {
            warn!(key = %key, "cached nearby response is unreadable, refetching");
            cache.remove(&key);
        }

        let response = cache
            .get_or_fetch(&key, move || async move {
                let credentials = credentials.ok_or(CrawlError::MissingCredentials)?;
                let params = self.nearby_params(credentials, site);
                let value = self
                    .fetcher
                    .fetch_signed(endpoint, &params, credentials)
                    .await?;
                // Never cache a response we cannot read back
                SearchResponse::deserialize(&value).map_err(|source| CrawlError::Decode {
                    key: key_ref.to_string(),
                    source,
                })?;
                Ok::<_, CrawlError>(value)
            })
            .await?;

        let parsed: SearchResponse =
            serde_json::from_value(response).map_err(|source| CrawlError::Decode {
                key: key.clone(),
                source,
            })?;

        let places: Vec<NearbyRecord> = parsed
            .search_results
            .unwrap_or_default()
            .into_iter()
            .map(NearbyRecord::from)
            .collect();

        debug!(key = %key, places = places.len(), "nearby resolved");

        Ok(places)
    }

    fn nearby_key(&self, site: &SiteRecord) -> String {
        match self.config.nearby.cache_key {
            NearbyCacheKey::Name => site.name.clone(),
            NearbyCacheKey::NameAndPostalCode => format!("{}|{}", site.name, site.postal_code),
        }
    }

    fn nearby_params(&self, credentials: &Credentials, site: &SiteRecord) -> Vec<(String, String)> {
        let nearby = &self.config.nearby;

        vec![
            ("key".to_string(), credentials.key.clone()),
            ("origin".to_string(), site.postal_code.clone()),
            ("radius".to_string(), nearby.radius.to_string()),
            ("maxMatches".to_string(), nearby.max_matches.to_string()),
            ("ambiguities".to_string(), nearby.ambiguities.clone()),
            ("outFormat".to_string(), nearby.out_format.clone()),
        ]
    }

    // Plain page through the cache; only a miss waits out the request delay
    async fn fetch_page(&self, cache: &mut ResponseCache, url: &str) -> Result<String, CrawlError> {
        if cache.get(url).is_some_and(|cached| !cached.is_string()) {
            warn!(url, "cached page is not a body, refetching");
            cache.remove(url);
        }

        let value = cache
            .get_or_fetch(url, move || async move {
                sleep(self.config.request_delay()).await;
                let body = self.fetcher.fetch_text(url).await?;
                Ok::<_, CrawlError>(Value::String(body))
            })
            .await?;

        // Only string entries survive the check above
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
