use thiserror::Error;

/// Failure of a single request against the remote API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Whether a retry may succeed: transport failures, 5xx and 429
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Network(_) => true,
            FetchError::HttpStatus(code) => *code >= 500 || *code == 429,
            FetchError::MalformedPayload(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::MalformedPayload(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}
