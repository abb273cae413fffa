//! Error handling for portal publishing
//!
//! Every failure a workflow can surface is a variant of [`PortalError`], carrying
//! enough detail (deployment id, HTTP status and body, timeout bounds, server
//! reasons) to diagnose the failure without re-running.

use crate::core::traits::DeploymentState;
use std::time::Duration;
use thiserror::Error;

/// Result type for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Main error type for portal publishing operations
#[derive(Error, Debug)]
pub enum PortalError {
    // Local input errors, raised before any request is sent
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid bundle: {0}")]
    Validation(String),

    // Protocol errors
    #[error("HTTP error during {context}: {status}\nResponse: {body}")]
    Transport {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("upload returned {status} but no deploymentId body; body={body}")]
    UnexpectedUploadResponse { status: u16, body: String },

    #[error("failed to parse status JSON (HTTP {status}): {body}")]
    Parse {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    // Wait errors
    #[error(
        "timed out after {} waiting for deployment {deployment_id} to reach one of {}",
        humantime::format_duration(*.timeout),
        format_states(.terminal_states)
    )]
    Timeout {
        deployment_id: String,
        terminal_states: Vec<DeploymentState>,
        timeout: Duration,
    },

    #[error("wait for deployment {deployment_id} was cancelled")]
    Cancelled { deployment_id: String },

    #[error("upload of {deployment_name} was cancelled")]
    UploadCancelled { deployment_name: String },

    #[error("deployment {deployment_id} FAILED{}", format_reasons(.reasons))]
    DeploymentFailed {
        deployment_id: String,
        reasons: Vec<String>,
    },

    // Underlying failures
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_states(states: &[DeploymentState]) -> String {
    let names: Vec<&str> = states.iter().map(DeploymentState::as_str).collect();
    format!("[{}]", names.join(", "))
}

fn format_reasons(reasons: &[String]) -> String {
    if reasons.is_empty() {
        return "\n(no error details returned)".to_string();
    }
    reasons.iter().map(|r| format!("\n- {}", r)).collect()
}

impl PortalError {
    /// Whether a single failed status poll may be treated as a blip
    ///
    /// Server-side errors (5xx), rate limiting and connection failures are
    /// transient; everything else reflects a problem retrying will not fix.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { status, .. } => *status >= 500 || *status == 429,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::UnexpectedUploadResponse { .. } => "PROTOCOL_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
            Self::Cancelled { .. } | Self::UploadCancelled { .. } => "CANCELLED",
            Self::DeploymentFailed { .. } => "DEPLOYMENT_FAILED",
            Self::Http(_) => "HTTP_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration(_) => vec![
                "Set the portal username and password environment variables",
                "Check the --config file and --deployment-id arguments",
            ],
            Self::Validation(_) => vec!["Check that the bundle was built and is not empty"],
            Self::Transport { status, .. } if *status == 401 || *status == 403 => {
                vec!["Check the portal user token credentials"]
            }
            Self::Transport { .. } | Self::Http(_) => vec![
                "Check network connectivity to the portal",
                "Retry later; the portal may be degraded",
            ],
            Self::UnexpectedUploadResponse { .. } | Self::Parse { .. } => {
                vec!["The portal API may have changed; inspect the response body"]
            }
            Self::Timeout { .. } => vec![
                "Check the deployment in the portal UI",
                "Increase --timeout and wait again with wait-for-publication",
            ],
            Self::Cancelled { .. } => {
                vec!["Resume with wait-for-publication using the same deployment id"]
            }
            Self::UploadCancelled { .. } => vec![
                "Check the portal UI for a partial deployment before uploading again",
            ],
            Self::DeploymentFailed { .. } => vec![
                "Fix the reported problems and upload a new bundle",
                "Drop the failed deployment in the portal UI",
            ],
            Self::Io(_) => vec!["Check the bundle path and file permissions"],
        }
    }
}
