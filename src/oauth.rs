//! One-legged OAuth1 request signing (HMAC-SHA1, consumer key and secret only).

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use sha1::Sha1;
use thiserror::Error;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

// RFC 3986 unreserved characters stay literal
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid request url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid signing key")]
    Key,
}

/// Pre-provisioned application identity.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Builds an `Authorization` header value for a request, with a fresh nonce
/// and the current timestamp.
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &Credentials,
) -> Result<String, OAuthError> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();
    let timestamp = Utc::now().timestamp().to_string();

    sign(method, url, params, credentials, &nonce, &timestamp)
}

/// Deterministic half of [`authorization_header`].
pub fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &Credentials,
    nonce: &str,
    timestamp: &str,
) -> Result<String, OAuthError> {
    let oauth_params = [
        ("oauth_nonce", nonce),
        ("oauth_timestamp", timestamp),
        ("oauth_version", VERSION),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_consumer_key", credentials.key.as_str()),
    ];

    let base = signature_base_string(method, url, params, &oauth_params)?;

    // No token secret in the one-legged flow, hence the bare trailing '&'
    let key = format!("{}&", encode(&credentials.secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| OAuthError::Key)?;
    mac.update(base.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let mut header = String::from("OAuth ");
    for (name, value) in oauth_params
        .iter()
        .copied()
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
    {
        if header.len() > "OAuth ".len() {
            header.push_str(", ");
        }
        header.push_str(&format!("{}=\"{}\"", name, encode(value)));
    }

    Ok(header)
}

pub(crate) fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
    oauth_params: &[(&str, &str)],
) -> Result<String, OAuthError> {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_uri(url)?),
        encode(&normalized)
    ))
}

// Scheme and host lower-cased, default port dropped, query and fragment removed
fn base_uri(url: &str) -> Result<String, OAuthError> {
    let parsed = Url::parse(url).map_err(|source| OAuthError::Url {
        url: url.to_string(),
        source,
    })?;

    let host = parsed.host_str().unwrap_or_default();
    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(format!("{}://{}{}", parsed.scheme(), authority, parsed.path()))
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, RFC3986).to_string()
}
