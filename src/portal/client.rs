//! Client for the portal publisher API
//!
//! Two endpoints, both `POST` and both authorized with the bearer token:
//! - `{base}/api/v1/publisher/upload?name=..&publishingType=..` takes the
//!   bundle as a multipart `bundle` field and answers `201` with the
//!   deployment id as plain text.
//! - `{base}/api/v1/publisher/status?id=..` takes an empty body and answers
//!   with a JSON [`StatusResponse`].

use crate::core::config::PortalConfig;
use crate::core::error::{PortalError, Result};
use crate::core::traits::{Bundle, PortalApi, PublishingType, StatusResponse};
use crate::portal::transport::Transport;
use crate::security::{AuthToken, CredentialProvider};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use tracing::debug;

const UPLOAD_PATH: &str = "api/v1/publisher/upload";
const STATUS_PATH: &str = "api/v1/publisher/status";

/// Portal API client owning its transport and authorization token
#[derive(Debug)]
pub struct PortalClient {
    upload_url: Url,
    status_url: Url,
    token: AuthToken,
    transport: Transport,
    publishing_type: PublishingType,
}

impl PortalClient {
    pub fn new(base_url: &str, token: AuthToken, transport: Transport) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| {
            PortalError::Configuration(format!("invalid portal URL {:?}: {}", base_url, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let join = |path: &str| {
            base.join(path)
                .map_err(|e| PortalError::Configuration(format!("invalid portal URL: {}", e)))
        };

        Ok(Self {
            upload_url: join(UPLOAD_PATH)?,
            status_url: join(STATUS_PATH)?,
            token,
            transport,
            publishing_type: PublishingType::default(),
        })
    }

    /// Build a client from configuration, resolving credentials first
    ///
    /// Missing credentials fail here, before any network activity.
    pub fn from_config(config: &PortalConfig, credentials: &dyn CredentialProvider) -> Result<Self> {
        let token = AuthToken::from_provider(credentials)?;
        let transport = Transport::new(&config.transport)?;

        Ok(Self::new(&config.base_url, token, transport)?
            .with_publishing_type(config.publishing_type))
    }

    pub fn with_publishing_type(mut self, publishing_type: PublishingType) -> Self {
        self.publishing_type = publishing_type;
        self
    }

    async fn http_error(context: &'static str, response: Response) -> PortalError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        PortalError::Transport {
            context,
            status,
            body,
        }
    }
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn upload_bundle(&self, bundle: &Bundle) -> Result<String> {
        let size = bundle.validate().await?;
        let content = Bytes::from(tokio::fs::read(bundle.path()).await?);
        let file_name = bundle
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| bundle.deployment_name().to_string());

        debug!(
            bundle = %bundle.path().display(),
            size,
            name = bundle.deployment_name(),
            "uploading bundle"
        );

        let response = self
            .transport
            .send(|client| {
                let part = Part::stream_with_length(content.clone(), content.len() as u64)
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")?;

                Ok(client
                    .post(self.upload_url.clone())
                    .query(&[
                        ("name", bundle.deployment_name()),
                        ("publishingType", self.publishing_type.as_str()),
                    ])
                    .header(AUTHORIZATION, self.token.header_value())
                    .multipart(Form::new().part("bundle", part)))
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::http_error("upload", response).await);
        }

        let body = response.text().await?;
        let deployment_id = body.trim();
        if status != StatusCode::CREATED || deployment_id.is_empty() {
            return Err(PortalError::UnexpectedUploadResponse {
                status: status.as_u16(),
                body,
            });
        }

        debug!(deployment_id, "bundle uploaded");
        Ok(deployment_id.to_string())
    }

    async fn get_status(&self, deployment_id: &str) -> Result<StatusResponse> {
        let response = self
            .transport
            .send(|client| {
                Ok(client
                    .post(self.status_url.clone())
                    .query(&[("id", deployment_id)])
                    .header(AUTHORIZATION, self.token.header_value())
                    .body(Vec::new()))
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::http_error("status", response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| PortalError::Parse {
            status: status.as_u16(),
            body,
            source,
        })
    }
}
