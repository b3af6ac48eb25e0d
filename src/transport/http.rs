//! HTTP transport backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use locklink_shared::CommandEnvelope;

use super::traits::{CommandTransport, HttpReply, TransportFailure};

/// Production transport: one JSON POST per dispatch call
///
/// The timeout is set on the client so every request carries the same fixed
/// bound as the dispatcher's own deadline.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given per-request timeout
    pub fn new(request_timeout: Duration) -> Result<Self, TransportFailure> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            // the upstream service expects a mobile browser UA
            .user_agent(
                "Mozilla/5.0 (Linux; Android 10) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/91.0.4472.124 Mobile Safari/537.36",
            )
            .build()
            .map_err(|e| TransportFailure::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        envelope: &CommandEnvelope,
    ) -> Result<HttpReply, TransportFailure> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(envelope)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpReply { status, body })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Other(error.to_string())
    }
}
