use std::sync::LazyLock;

use async_trait::async_trait;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::oauth::{self, Credentials, OAuthError};

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).expect("charset pattern is valid")
});

// Only the head of the document is sniffed for a meta charset
const SNIFF_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not sign request: {0}")]
    Sign(#[from] OAuthError),
}

/// Outbound HTTP used by the resolver.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Plain GET. The body comes back whatever the status code.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET signed with one-legged OAuth1, body decoded as JSON. A non-2xx
    /// status is an error.
    async fn fetch_signed(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        credentials: &Credentials,
    ) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url, "non-success status, keeping body");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(transport)?;

        Ok(decode_html(content_type.as_deref(), &bytes))
    }

    async fn fetch_signed(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        credentials: &Credentials,
    ) -> Result<Value, FetchError> {
        let header = oauth::authorization_header("GET", endpoint, params, credentials)?;

        let response = self
            .client
            .get(endpoint)
            .query(params)
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, endpoint, "signed request rejected");
            return Err(FetchError::Status {
                url: endpoint.to_string(),
                status,
            });
        }

        response.json::<Value>().await.map_err(|source| FetchError::Decode {
            url: endpoint.to_string(),
            source,
        })
    }
}

/// Decodes an HTML body: header charset first, then a `<meta>` charset, then detection.
pub fn decode_html(content_type: Option<&str>, bytes: &[u8]) -> String {
    // 1. Charset from header
    if let Some(charset) = content_type.and_then(|ct| ct.split("charset=").nth(1)) {
        let label = charset.trim().trim_matches('"');
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            debug!(encoding = encoding.name(), "charset from header");
            let (text, _, _) = encoding.decode(bytes);
            return text.into_owned();
        }
    }

    // 2. Charset from meta tag (ASCII-safe)
    let ascii_head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);

    if let Some(cap) = META_CHARSET.captures(&ascii_head) {
        if let Some(encoding) = Encoding::for_label(cap[1].as_bytes()) {
            debug!(encoding = encoding.name(), "charset from meta tag");
            let (text, _, _) = encoding.decode(bytes);
            return text.into_owned();
        }
    }

    // 3. Fallback: detect
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, _, _) = encoding.decode(bytes);

    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_uses_header_charset() {
        // "Café" in windows-1252
        let bytes = b"<p>Caf\xe9</p>";

        let text = decode_html(Some("text/html; charset=windows-1252"), bytes);

        assert_eq!(text, "<p>Café</p>");
    }

    #[test]
    fn test_decode_uses_meta_charset_without_header() {
        let mut bytes = b"<html><head><meta charset=\"iso-8859-1\"></head><body>".to_vec();
        bytes.extend_from_slice(b"Mus\xe9e</body></html>");

        let text = decode_html(Some("text/html"), &bytes);

        assert!(text.contains("Musée"));
    }

    #[test]
    fn test_decode_plain_utf8() {
        let text = decode_html(None, "<p>Yellowstone</p>".as_bytes());

        assert_eq!(text, "<p>Yellowstone</p>");
    }

    #[test]
    fn test_decode_ignores_unknown_header_label() {
        let text = decode_html(Some("text/html; charset=bogus"), "<p>ok</p>".as_bytes());

        assert_eq!(text, "<p>ok</p>");
    }

    // Answers a single request with a canned 403
    async fn forbidden_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"info":{"statuscode":403}}"#;
            let response = format!(
                "HTTP/1.1 403 Forbidden\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        format!("http://{}/search", addr)
    }

    #[tokio::test]
    async fn test_signed_non_success_is_an_error() {
        let endpoint = forbidden_server().await;
        let credentials = Credentials::new("key", "secret");
        let params = vec![("origin".to_string(), "49931".to_string())];

        let result = HttpFetcher::new()
            .fetch_signed(&endpoint, &params, &credentials)
            .await;

        match result {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(url, endpoint);
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }
}
