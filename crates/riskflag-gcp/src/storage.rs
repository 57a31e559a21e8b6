//! Cloud Storage object download
//!
//! Fetches an object body as text through the JSON API
//! (`GET /storage/v1/b/{bucket}/o/{object}?alt=media`).

use crate::config::StorageConfig;
use crate::error::{classify_send_error, GcpError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Address of an object in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcsObject {
    pub bucket: String,
    pub name: String,
}

impl GcsObject {
    pub fn new(bucket: &str, name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse a `gs://bucket/path/to/object` URI.
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("gs://")?;
        let (bucket, name) = rest.split_once('/')?;
        if bucket.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(bucket, name))
    }
}

impl fmt::Display for GcsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.name)
    }
}

/// Cloud Storage client for object reads
#[derive(Debug)]
pub struct GcsClient {
    config: StorageConfig,
    http_client: reqwest::Client,
}

impl GcsClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("riskflag-gcp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(GcsClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(StorageConfig::from_env())
    }

    /// Media download URL for an object; the object name is percent-encoded
    /// as a single path segment.
    pub fn media_url(&self, object: &GcsObject) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_endpoint).map_err(|e| {
            GcpError::InvalidConfig(format!(
                "storage endpoint {:?}: {}",
                self.config.api_endpoint, e
            ))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GcpError::InvalidConfig(format!(
                    "storage endpoint {:?} cannot be a base URL",
                    self.config.api_endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "b", object.bucket.as_str(), "o", object.name.as_str()]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Download an object and decode it as UTF-8 text.
    pub async fn download_text(&self, object: &GcsObject) -> Result<String> {
        let url = self.media_url(object)?;
        info!(object = %object, "Downloading object from Cloud Storage");

        let mut builder = self.http_client.get(url);
        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            classify_send_error(e, &self.config.api_endpoint, self.config.timeout_secs)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}
