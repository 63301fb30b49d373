use thiserror::Error;

/// Navigation failures. Recovered at the task level: the enclosing search
/// or enrichment item is skipped, never the whole run.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("navigation timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for NavError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        NavError::Browser(err.to_string())
    }
}

/// Record store failures. Missing configuration is fatal and raised before
/// any navigation; API and network failures during writes are logged and
/// the run continues with the next chunk or record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing required environment variable {0}")]
    MissingConfig(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("store error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}
