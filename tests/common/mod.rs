#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use nps_crawler::config::Config;
use nps_crawler::fetch::{FetchError, Fetcher};
use nps_crawler::oauth::Credentials;

pub const BASE: &str = "https://www.nps.gov";

/// Serves canned pages and API responses and records every call.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    // keyed by the `origin` parameter
    nearby: HashMap<String, Value>,
    rejected: HashMap<String, StatusCode>,
    text_calls: Mutex<Vec<String>>,
    signed_calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Michigan slice of the directory site plus one nearby response.
    pub fn michigan() -> Self {
        Self::new()
            .page(BASE, include_str!("../fixtures/home.html"))
            .page(
                "https://www.nps.gov/state/mi/index.htm",
                include_str!("../fixtures/state_mi.html"),
            )
            .page("https://www.nps.gov/slbe/", include_str!("../fixtures/slbe.html"))
            .page("https://www.nps.gov/isro/", include_str!("../fixtures/isro.html"))
            .page("https://www.nps.gov/kewe/", include_str!("../fixtures/kewe.html"))
            .nearby(
                "49931",
                serde_json::from_str(include_str!("../fixtures/nearby_isro.json")).unwrap(),
            )
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn nearby(mut self, origin: &str, response: Value) -> Self {
        self.nearby.insert(origin.to_string(), response);
        self
    }

    pub fn failing_nearby(mut self, origin: &str, status: StatusCode) -> Self {
        self.rejected.insert(origin.to_string(), status);
        self
    }

    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().unwrap().clone()
    }

    pub fn signed_calls(&self) -> Vec<Vec<(String, String)>> {
        self.signed_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.text_calls.lock().unwrap().push(url.to_string());
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body>Not Found</body></html>".to_string()))
    }

    async fn fetch_signed(
        &self,
        _endpoint: &str,
        params: &[(String, String)],
        _credentials: &Credentials,
    ) -> Result<Value, FetchError> {
        self.signed_calls.lock().unwrap().push(params.to_vec());
        let origin = params
            .iter()
            .find(|(k, _)| k == "origin")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        if let Some(&status) = self.rejected.get(&origin) {
            return Err(FetchError::Status {
                url: "https://nearby.test/search".to_string(),
                status,
            });
        }
        Ok(self
            .nearby
            .get(&origin)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({ "resultsCount": 0 })))
    }
}

pub fn test_config() -> Config {
    Config {
        request_delay_ms: 0,
        credentials: Some(Credentials::new("test-key", "test-secret")),
        ..Config::default()
    }
}
