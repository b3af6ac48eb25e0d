//! Transport trait abstraction for pluggable command backends

use async_trait::async_trait;
use locklink_shared::CommandEnvelope;
use thiserror::Error;

/// Raw HTTP reply handed back to the dispatcher for interpretation
#[derive(Debug, Clone)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpReply {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures, below the HTTP status layer
#[derive(Error, Debug, Clone)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// A backend that can deliver one command envelope and return the reply
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Perform a single POST of the envelope to `url`
    async fn post(&self, url: &str, envelope: &CommandEnvelope)
        -> Result<HttpReply, TransportFailure>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
