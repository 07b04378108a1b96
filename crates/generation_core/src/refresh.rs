//! Completion hook that lets cached views (remaining quota and the like) re-fetch.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::transport::parse_endpoint;

#[async_trait]
pub trait RefreshHandle: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}

pub struct NoopRefresh;

#[async_trait]
impl RefreshHandle for NoopRefresh {
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

/// Issues a GET against a usage endpoint and discards the body.
pub struct HttpRefresh {
    http: Client,
    url: Url,
}

impl HttpRefresh {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, None)
    }

    pub fn with_timeout(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = parse_endpoint(url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build refresh HTTP client")?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RefreshHandle for HttpRefresh {
    async fn refresh(&self) -> Result<()> {
        self.http
            .get(self.url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach refresh endpoint {}", self.url))?
            .error_for_status()
            .context("refresh endpoint rejected the request")?;
        Ok(())
    }
}
