//! Publish workflow
//!
//! Uploads a bundle, then follows the new deployment until the portal has
//! validated it (`VALIDATED`) or rejected it (`FAILED`).

use crate::core::cancel::CancellationSignal;
use crate::core::config::PortalConfig;
use crate::core::error::{PortalError, Result};
use crate::core::traits::{Bundle, DeploymentState, PollConfig, PortalApi};
use crate::orchestration::report::{DeploymentReport, follow_deployment};
use crate::portal::PortalClient;
use crate::security::CredentialProvider;
use tracing::info;

/// Upload-and-validate orchestrator
pub struct PublishWorkflow<P: PortalApi> {
    client: P,
    poll: PollConfig,
    cancel: CancellationSignal,
}

impl PublishWorkflow<PortalClient> {
    /// Build the workflow from configuration
    ///
    /// Credentials are resolved here, so a missing username or password
    /// fails before anything is uploaded.
    pub fn from_config(config: &PortalConfig, credentials: &dyn CredentialProvider) -> Result<Self> {
        let client = PortalClient::from_config(config, credentials)?;
        Ok(Self::new(client).with_poll_config(config.publish_poll()?))
    }
}

impl<P: PortalApi> PublishWorkflow<P> {
    pub fn new(client: P) -> Self {
        Self {
            client,
            poll: PollConfig::VALIDATION,
            cancel: CancellationSignal::new(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &P {
        &self.client
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    pub async fn run(&self, bundle: &Bundle) -> Result<DeploymentReport> {
        info!(
            "📦 Uploading {} as {}",
            bundle.path().display(),
            bundle.deployment_name()
        );

        let deployment_id = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(PortalError::UploadCancelled {
                    deployment_name: bundle.deployment_name().to_string(),
                });
            }
            result = self.client.upload_bundle(bundle) => result?,
        };
        info!("🆔 Deployment created (deploymentId={})", deployment_id);

        let report = follow_deployment(
            &self.client,
            &deployment_id,
            DeploymentState::Validated,
            &self.poll,
            &self.cancel,
        )
        .await?;

        info!("✅ Deployment {} validated", deployment_id);
        Ok(report)
    }
}
