//! Account data sources.
//!
//! A source yields one [`AccountData`] document per call: the raw vendor
//! payloads keyed by feed name. Talking to the vendor itself (login,
//! session cookies, retries) is left to whatever produces that document;
//! this module reads it from a JSON file or an HTTP endpoint.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::hub::AccountData;

/// Errors that can occur while fetching account data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Account data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Something that can produce the current account data.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<AccountData, FetchError>;
}

/// Reads a JSON snapshot from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AccountSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<AccountData, FetchError> {
        let contents = fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&contents)?;
        debug!("Read {} bytes of account data from {:?}", contents.len(), self.path);
        into_account_data(value)
    }
}

/// Configuration for [`HttpSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("rohlik-agent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches the account data document with a GET request.
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: &str, config: HttpSourceConfig) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("rohlik-agent")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl AccountSource for HttpSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<AccountData, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("request failed").to_string();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await?;
        debug!("Fetched account data from {}", self.url);
        into_account_data(value)
    }
}

/// Pick a source for `location`: an http(s) URL or a file path.
pub fn source_for(location: &str) -> Result<Box<dyn AccountSource>, FetchError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::new(location, HttpSourceConfig::default())?))
    } else {
        Ok(Box::new(FileSource::new(location)))
    }
}

fn into_account_data(value: Value) -> Result<AccountData, FetchError> {
    match value {
        Value::Object(map) => Ok(AccountData::from(map)),
        Value::Null => Err(FetchError::NotAnObject("null")),
        Value::Array(_) => Err(FetchError::NotAnObject("array")),
        Value::String(_) => Err(FetchError::NotAnObject("string")),
        Value::Number(_) => Err(FetchError::NotAnObject("number")),
        Value::Bool(_) => Err(FetchError::NotAnObject("bool")),
    }
}
