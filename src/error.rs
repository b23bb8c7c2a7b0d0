use thiserror::Error;
use tracing::error;

/// Detail captured from a failed call to a remote provider
#[derive(Debug, Clone, Default)]
pub struct UpstreamFailure {
    /// HTTP status, absent when the request never got a response
    pub status: Option<u16>,
    pub message: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of a failed gateway call
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("upstream request failed ({0})")]
    Upstream(UpstreamFailure),

    #[error("recommendation process failed: {0}")]
    Process(String),

    #[error("catalog query failed: {0}")]
    Catalog(#[from] rusqlite::Error),
}

impl GatewayError {
    pub fn upstream(message: impl Into<String>) -> Self {
        GatewayError::Upstream(UpstreamFailure {
            message: message.into(),
            ..Default::default()
        })
    }

    /// Status code the API surface answers with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Validation(_) => 400,
            GatewayError::Upstream(_) | GatewayError::Process(_) | GatewayError::Catalog(_) => 500,
        }
    }

    /// Write the full diagnostic detail to the log.
    pub fn log(&self, context: &str) {
        match self {
            GatewayError::Upstream(failure) => error!(
                status = ?failure.status,
                body = failure.body.as_deref().unwrap_or(""),
                headers = ?failure.headers,
                "{context}: {}",
                failure.message
            ),
            other => error!("{context}: {other}"),
        }
    }
}
