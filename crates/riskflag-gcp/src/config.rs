//! Environment-driven configuration for Vertex AI and Cloud Storage.
//!
//! Values are read once (usually at process start, after `.env` has been
//! loaded by the binary) and validated when a client is built, so a bad
//! configuration surfaces as a [`GcpError`] from [`VertexClient::new`]
//! instead of on the first request.
//!
//! [`VertexClient::new`]: crate::vertex::VertexClient::new

use crate::error::{GcpError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable holding the Google Cloud project id.
pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
/// Environment variable holding the Vertex AI location.
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
/// Environment variable selecting the generative model.
pub const ENV_MODEL: &str = "RISKFLAG_MODEL_ID";
/// Environment variable holding an OAuth2 bearer token.
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
/// Environment variable overriding the Vertex AI base URL.
pub const ENV_VERTEX_ENDPOINT: &str = "RISKFLAG_VERTEX_ENDPOINT";
/// Environment variable overriding the Cloud Storage base URL.
pub const ENV_STORAGE_ENDPOINT: &str = "RISKFLAG_STORAGE_ENDPOINT";

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Vertex AI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexConfig {
    /// Google Cloud project id
    pub project_id: Option<String>,
    /// Region such as `us-central1`, or `global`
    pub location: String,
    /// Publisher model id, e.g. `gemini-2.0-flash`
    pub model_id: String,
    /// OAuth2 bearer token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Base URL override (proxies, local test servers)
    pub api_endpoint: Option<String>,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl VertexConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        VertexConfig {
            project_id: get(ENV_PROJECT),
            location: get(ENV_LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            model_id: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            access_token: get(ENV_ACCESS_TOKEN),
            api_endpoint: get(ENV_VERTEX_ENDPOINT),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config for a specific project
    pub fn new(project_id: &str, location: &str, model_id: &str) -> Self {
        VertexConfig {
            project_id: Some(project_id.to_string()),
            location: location.to_string(),
            model_id: model_id.to_string(),
            access_token: None,
            api_endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Point the client at a different base URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.api_endpoint = Some(endpoint.to_string());
        self
    }

    /// Set the HTTP timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check that every value needed to issue a request is present.
    pub fn validate(&self) -> Result<()> {
        match self.project_id.as_deref() {
            None => return Err(GcpError::MissingConfig(ENV_PROJECT)),
            Some(p) if p.contains('/') => {
                return Err(GcpError::InvalidConfig(format!("project id {p:?} contains '/'")))
            }
            Some(_) => {}
        }
        if self.location.trim().is_empty() || self.location.contains('/') {
            return Err(GcpError::InvalidConfig(format!(
                "location {:?} is not a region name",
                self.location
            )));
        }
        if self.model_id.trim().is_empty() {
            return Err(GcpError::MissingConfig(ENV_MODEL));
        }
        if self.access_token.is_none() {
            return Err(GcpError::MissingConfig(ENV_ACCESS_TOKEN));
        }
        if self.timeout_secs == 0 {
            return Err(GcpError::InvalidConfig("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Base URL of the regional (or global) Vertex AI endpoint.
    pub fn base_url(&self) -> String {
        if let Some(endpoint) = &self.api_endpoint {
            return endpoint.trim_end_matches('/').to_string();
        }
        if self.location == "global" {
            "https://aiplatform.googleapis.com".to_string()
        } else {
            format!("https://{}-aiplatform.googleapis.com", self.location)
        }
    }

    /// Full `generateContent` URL for a publisher model.
    pub fn generate_content_url(&self, model: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url(),
            self.project_id.as_deref().unwrap_or_default(),
            self.location,
            model
        )
    }
}

/// Cloud Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the JSON API
    pub api_endpoint: String,
    /// OAuth2 bearer token (optional for public buckets)
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl StorageConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        StorageConfig {
            api_endpoint: get(ENV_STORAGE_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string()),
            access_token: get(ENV_ACCESS_TOKEN),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Point the client at a different base URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.api_endpoint = endpoint.to_string();
        self
    }
}
