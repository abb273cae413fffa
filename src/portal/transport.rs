//! HTTP transport shared by all portal calls
//!
//! One `reqwest::Client` with fixed timeouts, plus connection-level retry:
//! a request that could not be connected is rebuilt and sent again. Any
//! HTTP response, whatever its status, is handed back untouched.

use crate::core::config::TransportConfig;
use crate::core::error::{PortalError, Result};
use crate::core::retry::{RetryManager, RetryOptions};
use reqwest::{Client, RequestBuilder, Response};

/// Reusable HTTP client for the portal API
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    retry: RetryManager,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let retry = RetryManager::new(RetryOptions {
            max_attempts: config.connection_retries.max(1),
            ..RetryOptions::default()
        });

        Ok(Self { client, retry })
    }

    /// Send the request produced by `build`, re-building it for each attempt
    ///
    /// Only failures where no connection was made are retried, so a request
    /// the server may have processed is never sent twice.
    pub async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> Result<RequestBuilder>,
    {
        let build = &build;
        let client = &self.client;
        let response = self
            .retry
            .retry_if(
                || async move {
                    let request = build(client)?;
                    Ok::<Response, PortalError>(request.send().await?)
                },
                |error| matches!(error, PortalError::Http(e) if e.is_connect()),
            )
            .await?;

        tracing::debug!(url = %response.url(), status = %response.status(), "portal response");
        Ok(response)
    }
}
