use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out after {0} ms waiting for a location fix")]
    Timeout(u64),
    #[error("Location fix is {age_ms} ms old, maximum age is {max_age_ms} ms")]
    Stale { age_ms: i64, max_age_ms: u64 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: &'static str, reason: String },
}

impl FetchError {
    pub fn malformed(endpoint: &'static str, reason: impl Into<String>) -> Self {
        FetchError::MalformedResponse { endpoint, reason: reason.into() }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedResponse { .. })
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to write message: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Host rejected message: {0}")]
    Rejected(String),
}
