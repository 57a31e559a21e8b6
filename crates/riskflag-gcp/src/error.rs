//! Error types for riskflag-gcp

use thiserror::Error;

/// Errors that can occur while talking to Google Cloud services
#[derive(Error, Debug)]
pub enum GcpError {
    /// A required configuration value is absent
    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    /// A configuration value is present but unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The service could not be reached
    #[error("cannot reach service at {0}")]
    Connection(String),

    /// The request did not complete in time
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service answered with a non-success status
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service answered successfully but produced no text
    #[error("service returned an empty response")]
    EmptyResponse,

    /// Any other transport failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GcpError {
    fn from(err: reqwest::Error) -> Self {
        GcpError::Http(err.to_string())
    }
}

impl GcpError {
    /// Whether this error comes from configuration rather than the network.
    pub fn is_config(&self) -> bool {
        matches!(self, GcpError::MissingConfig(_) | GcpError::InvalidConfig(_))
    }
}

/// Result type for Google Cloud operations.
pub type Result<T> = std::result::Result<T, GcpError>;

/// Map a reqwest send error onto the taxonomy, keeping connect and timeout
/// failures distinguishable.
pub(crate) fn classify_send_error(err: reqwest::Error, target: &str, timeout_secs: u64) -> GcpError {
    if err.is_connect() {
        GcpError::Connection(target.to_string())
    } else if err.is_timeout() {
        GcpError::Timeout(timeout_secs)
    } else {
        GcpError::Http(err.to_string())
    }
}
