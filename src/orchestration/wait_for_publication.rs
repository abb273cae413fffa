//! Wait-for-publication workflow
//!
//! Follows an already-uploaded deployment until it is `PUBLISHED` or `FAILED`.

use crate::core::cancel::CancellationSignal;
use crate::core::config::PortalConfig;
use crate::core::error::{PortalError, Result};
use crate::core::traits::{DeploymentState, PollConfig, PortalApi};
use crate::orchestration::report::{DeploymentReport, follow_deployment};
use crate::portal::PortalClient;
use crate::security::CredentialProvider;
use tracing::info;

pub struct WaitForPublicationWorkflow<P: PortalApi> {
    client: P,
    poll: PollConfig,
    cancel: CancellationSignal,
}

impl WaitForPublicationWorkflow<PortalClient> {
    pub fn from_config(config: &PortalConfig, credentials: &dyn CredentialProvider) -> Result<Self> {
        let client = PortalClient::from_config(config, credentials)?;
        Ok(Self::new(client).with_poll_config(config.publication_poll()?))
    }
}

impl<P: PortalApi> WaitForPublicationWorkflow<P> {
    pub fn new(client: P) -> Self {
        Self {
            client,
            poll: PollConfig::PUBLICATION,
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

    /// Wait for `deployment_id` to be published
    ///
    /// A blank id is rejected without contacting the portal.
    pub async fn run(&self, deployment_id: &str) -> Result<DeploymentReport> {
        let deployment_id = deployment_id.trim();
        if deployment_id.is_empty() {
            return Err(PortalError::Configuration(
                "deploymentId is required".to_string(),
            ));
        }

        info!(
            "⏳ Waiting for deployment {} to be published (timeout {})",
            deployment_id,
            humantime::format_duration(self.poll.timeout())
        );

        let report = follow_deployment(
            &self.client,
            deployment_id,
            DeploymentState::Published,
            &self.poll,
            &self.cancel,
        )
        .await?;

        info!("🚀 Deployment {} published", deployment_id);
        Ok(report)
    }
}
