use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use super::template::RequestTemplate;
use crate::error::{HttpError, TransportError};

/// Executes one request/response cycle for a template.
///
/// Implementations must enforce their own per-request timeout and must not
/// touch shared run state; the worker records the outcome.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the template once and returns the response status code.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the round trip does not complete.
    async fn send(&self, template: &RequestTemplate) -> Result<u16, TransportError>;
}

/// `reqwest`-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Builds the client. A zero `timeout` disables the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client, timeout })
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, template: &RequestTemplate) -> Result<u16, TransportError> {
        let response = self
            .client
            .execute(template.to_request())
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError::Timeout { source: err }
                } else {
                    TransportError::Request { source: err }
                }
            })?;
        let status = response.status().as_u16();
        // The round trip is complete once the status line is in; a broken body
        // does not undo it.
        if let Err(err) = drain_response_body(response).await {
            debug!("Failed to read response body (status {}): {}", status, err);
        }
        Ok(status)
    }
}

// Reading the body to the end lets the connection go back to the pool.
async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
