use thiserror::Error;

/// Raised while building the request template or transport; the run never starts.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid HTTP method '{method}': {source}")]
    InvalidMethod {
        method: String,
        #[source]
        source: ::http::method::InvalidMethod,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid User-Agent '{value}': {source}")]
    InvalidUserAgent {
        value: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}

/// A single attempt that did not complete a round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {source}")]
    Timeout {
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to send request: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    /// For [`Transport`](crate::http::Transport) implementations that do not
    /// sit on `reqwest`.
    #[error("connection error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout { .. } => true,
            TransportError::Io { source } => source.kind() == std::io::ErrorKind::TimedOut,
            TransportError::Request { .. } => false,
        }
    }
}
