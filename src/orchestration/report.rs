//! Following a deployment to its terminal state and reporting the outcome

use crate::core::cancel::CancellationSignal;
use crate::core::error::{PortalError, Result};
use crate::core::state_machine::wait_for_status;
use crate::core::traits::{
    DeploymentState, PollConfig, PortalApi, StateTransition, StatusResponse,
};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Outcome of a workflow that reached its success state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub deployment_id: String,
    /// The terminal status as last returned by the portal
    pub status: StatusResponse,
    /// Every state change observed, first observation included
    pub transitions: Vec<StateTransition>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl DeploymentReport {
    pub fn purls(&self) -> &[String] {
        self.status.purls.as_deref().unwrap_or_default()
    }
}

/// Wait for `success` or `FAILED`, turning `FAILED` into an error
pub(crate) async fn follow_deployment<P>(
    client: &P,
    deployment_id: &str,
    success: DeploymentState,
    poll: &PollConfig,
    cancel: &CancellationSignal,
) -> Result<DeploymentReport>
where
    P: PortalApi + ?Sized,
{
    let terminal_states = [success.clone(), DeploymentState::Failed];
    let started = Instant::now();
    let mut transitions = Vec::new();

    let status = wait_for_status(
        client,
        deployment_id,
        &terminal_states,
        poll,
        cancel,
        |old, new| {
            info!("📡 Status: {} (deploymentId={})", new, deployment_id);
            transitions.push(StateTransition {
                from: old.cloned(),
                to: new.clone(),
                observed_at: Utc::now(),
            });
        },
    )
    .await?;

    settle(deployment_id, status, &success, transitions, started.elapsed())
}

/// Map a terminal status onto the workflow result
///
/// Any state other than `success` or `FAILED` means the caller asked the
/// state machine for a terminal set it does not handle, so it panics.
fn settle(
    deployment_id: &str,
    status: StatusResponse,
    success: &DeploymentState,
    transitions: Vec<StateTransition>,
    elapsed: Duration,
) -> Result<DeploymentReport> {
    match &status.deployment_state {
        state if state == success => Ok(DeploymentReport {
            deployment_id: deployment_id.to_string(),
            status,
            transitions,
            elapsed,
        }),
        DeploymentState::Failed => Err(PortalError::DeploymentFailed {
            deployment_id: deployment_id.to_string(),
            reasons: status.failure_reasons(),
        }),
        other => unreachable!(
            "unexpected terminal state {} for deployment {}",
            other, deployment_id
        ),
    }
}
