//! Poll/wait state machine for deployments
//!
//! The portal offers no push notification, so a deployment is followed by
//! polling its status at a fixed interval until it enters one of a set of
//! terminal states or an absolute deadline passes.
//!
//! Deadline semantics: a status call is issued whenever the clock has not
//! passed the deadline (`now <= deadline`). A wait in which no terminal state
//! is ever seen therefore issues `floor(timeout / poll_interval) + 1` status
//! calls before failing with [`PortalError::Timeout`]. The wait fails as soon
//! as the next poll would fall after the deadline, so it never sleeps past it.

use crate::core::cancel::CancellationSignal;
use crate::core::error::{PortalError, Result};
use crate::core::traits::{DeploymentState, PollConfig, PortalApi, StatusResponse};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Poll `deployment_id` until its state is one of `terminal_states`
///
/// `on_state_change(old, new)` fires once per observed transition, including
/// the first observation (`old == None`). Status is never re-queried before
/// `poll_interval` has elapsed, and a terminal state is returned as soon as it
/// is seen. Cancellation is honoured before each poll, while a poll is in
/// flight, and during the sleep between polls.
pub async fn wait_for_status<P, F>(
    client: &P,
    deployment_id: &str,
    terminal_states: &[DeploymentState],
    poll: &PollConfig,
    cancel: &CancellationSignal,
    mut on_state_change: F,
) -> Result<StatusResponse>
where
    P: PortalApi + ?Sized,
    F: FnMut(Option<&DeploymentState>, &DeploymentState),
{
    let deadline = Instant::now() + poll.timeout();
    let mut last_state: Option<DeploymentState> = None;
    let mut consecutive_failures = 0u32;
    let cancelled = || PortalError::Cancelled {
        deployment_id: deployment_id.to_string(),
    };

    while Instant::now() <= deadline {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            result = client.get_status(deployment_id) => result,
        };

        match outcome {
            Ok(status) => {
                consecutive_failures = 0;
                let state = &status.deployment_state;
                debug!(deployment_id, %state, "polled deployment status");

                if last_state.as_ref() != Some(state) {
                    on_state_change(last_state.as_ref(), state);
                    last_state = Some(state.clone());
                }

                if terminal_states.contains(state) {
                    return Ok(status);
                }
            }
            Err(error)
                if error.is_transient()
                    && consecutive_failures < poll.max_consecutive_failures() =>
            {
                consecutive_failures += 1;
                warn!(
                    deployment_id,
                    consecutive_failures,
                    %error,
                    "status poll failed, will retry on next interval"
                );
            }
            Err(error) => return Err(error),
        }

        if Instant::now() + poll.poll_interval() > deadline {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = tokio::time::sleep(poll.poll_interval()) => {}
        }
    }

    Err(PortalError::Timeout {
        deployment_id: deployment_id.to_string(),
        terminal_states: terminal_states.to_vec(),
        timeout: poll.timeout(),
    })
}
