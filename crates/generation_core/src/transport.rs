//! Outbound calls to the image generation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ArtifactRef,
    protocol::{parse_generation_response, GenerateImagesRequest},
    validation::Request,
};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Sends one validated request and returns the artifact references in
    /// response order.
    async fn generate(&self, request: &Request) -> Result<Vec<ArtifactRef>, TransportError>;
}

pub struct MissingGenerationTransport;

#[async_trait]
impl GenerationTransport for MissingGenerationTransport {
    async fn generate(&self, _request: &Request) -> Result<Vec<ArtifactRef>, TransportError> {
        Err(TransportError::Unavailable)
    }
}

/// POSTs `{prompt, amount, resolution}` as JSON to a fixed endpoint.
pub struct HttpGenerationTransport {
    http: Client,
    endpoint: Url,
}

impl HttpGenerationTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::with_timeout(endpoint, None)
    }

    pub fn with_timeout(endpoint: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let endpoint = parse_endpoint(endpoint)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationTransport for HttpGenerationTransport {
    async fn generate(&self, request: &Request) -> Result<Vec<ArtifactRef>, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateImagesRequest::from(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "received generation response");
        parse_generation_response(&body).map_err(|e| TransportError::MalformedBody(e.to_string()))
    }
}

pub(crate) fn parse_endpoint(raw: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
