//! Core traits and types for portal publishing
//!
//! This module defines the protocol abstraction ([`PortalApi`]) and the data
//! exchanged with the portal: bundles, deployment states and status responses.

use crate::core::error::{PortalError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Deployment State
// ============================================================================

/// Lifecycle state of a deployment as reported by the portal
///
/// States the client does not know about are kept verbatim in [`Other`](Self::Other)
/// so a newer server never breaks status parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeploymentState {
    Pending,
    Validating,
    Validated,
    Publishing,
    Published,
    Failed,
    Other(String),
}

impl DeploymentState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Validating => "VALIDATING",
            Self::Validated => "VALIDATED",
            Self::Publishing => "PUBLISHING",
            Self::Published => "PUBLISHED",
            Self::Failed => "FAILED",
            Self::Other(state) => state,
        }
    }
}

impl From<String> for DeploymentState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => Self::Pending,
            "VALIDATING" => Self::Validating,
            "VALIDATED" => Self::Validated,
            "PUBLISHING" => Self::Publishing,
            "PUBLISHED" => Self::Published,
            "FAILED" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<DeploymentState> for String {
    fn from(state: DeploymentState) -> Self {
        match state {
            DeploymentState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Body of the portal's status endpoint
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub deployment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    pub deployment_state: DeploymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purls: Option<Vec<String>>,
    /// Error category -> reasons, only present for `FAILED`; kept in server order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<IndexMap<String, Vec<String>>>,
}

impl StatusResponse {
    /// All server-reported reasons, flattened across categories
    pub fn failure_reasons(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|errors| errors.values())
            .flatten()
            .cloned()
            .collect()
    }
}

/// A state change observed while polling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTransition {
    pub from: Option<DeploymentState>,
    pub to: DeploymentState,
    pub observed_at: DateTime<Utc>,
}

// ============================================================================
// Upload
// ============================================================================

/// Whether the portal releases a validated deployment on its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishingType {
    #[default]
    Automatic,
    /// Upload and validate, but leave the release to a human in the portal UI
    UserManaged,
}

impl PublishingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::UserManaged => "USER_MANAGED",
        }
    }
}

/// A bundle file and the deployment name it is uploaded under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    path: PathBuf,
    deployment_name: String,
}

impl Bundle {
    /// Create a bundle whose deployment name is the file name
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let deployment_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            deployment_name,
        }
    }

    pub fn with_deployment_name(mut self, name: impl Into<String>) -> Self {
        self.deployment_name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    /// Check the bundle is a non-empty regular file, returning its size
    pub async fn validate(&self) -> Result<u64> {
        let invalid =
            || PortalError::Validation(format!("bundle does not exist or is empty: {}", self.path.display()));

        let metadata = tokio::fs::metadata(&self.path).await.map_err(|_| invalid())?;
        if !metadata.is_file() || metadata.len() == 0 {
            return Err(invalid());
        }

        Ok(metadata.len())
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Cadence and bound of a status wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    poll_interval: Duration,
    timeout: Duration,
    max_consecutive_failures: u32,
}

impl PollConfig {
    /// Defaults for waiting on validation after an upload
    pub const VALIDATION: Self = Self {
        poll_interval: Duration::from_secs(15),
        timeout: Duration::from_secs(45 * 60),
        max_consecutive_failures: 0,
    };

    /// Defaults for waiting on final publication
    pub const PUBLICATION: Self = Self {
        poll_interval: Duration::from_secs(30),
        timeout: Duration::from_secs(90 * 60),
        max_consecutive_failures: 0,
    };

    pub fn new(poll_interval: Duration, timeout: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(PortalError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            poll_interval,
            timeout,
            max_consecutive_failures: 0,
        })
    }

    /// Tolerate up to `n` consecutive transient status failures before giving up
    pub fn with_max_consecutive_failures(mut self, n: u32) -> Self {
        self.max_consecutive_failures = n;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_consecutive_failures(&self) -> u32 {
        self.max_consecutive_failures
    }
}

// ============================================================================
// Portal API Trait
// ============================================================================

/// The two operations of the portal's publisher API
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// Upload a bundle, returning the server-assigned deployment id
    ///
    /// Every successful call creates a new deployment; callers must not
    /// retry it blindly.
    async fn upload_bundle(&self, bundle: &Bundle) -> Result<String>;

    /// Fetch the current status of a deployment
    async fn get_status(&self, deployment_id: &str) -> Result<StatusResponse>;
}

#[async_trait]
impl<T: PortalApi + ?Sized> PortalApi for std::sync::Arc<T> {
    async fn upload_bundle(&self, bundle: &Bundle) -> Result<String> {
        (**self).upload_bundle(bundle).await
    }

    async fn get_status(&self, deployment_id: &str) -> Result<StatusResponse> {
        (**self).get_status(deployment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_deployment_state_parsing() {
        let state: DeploymentState = serde_json::from_str(r#""VALIDATED""#).unwrap();
        assert_eq!(state, DeploymentState::Validated);

        let state: DeploymentState = serde_json::from_str(r#""QUARANTINED""#).unwrap();
        assert_eq!(state, DeploymentState::Other("QUARANTINED".to_string()));
        assert_eq!(state.to_string(), "QUARANTINED");
    }

    #[test]
    fn test_deployment_state_serialization() {
        let json = serde_json::to_string(&DeploymentState::Publishing).unwrap();
        assert_eq!(json, r#""PUBLISHING""#);
    }

    #[test]
    fn test_status_response_ignores_unknown_fields() {
        let json = r#"{
            "deploymentId": "28570f16-da32-4c14-bd2e-c1acc0782365",
            "deploymentName": "central-bundle.zip",
            "deploymentState": "PUBLISHED",
            "purls": ["pkg:maven/com.example/lib@1.0.0"],
            "createTimestamp": 1700000000000,
            "cherryBomUrl": null
        }"#;

        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.deployment_id, "28570f16-da32-4c14-bd2e-c1acc0782365");
        assert_eq!(status.deployment_name.as_deref(), Some("central-bundle.zip"));
        assert_eq!(status.deployment_state, DeploymentState::Published);
        assert_eq!(
            status.purls,
            Some(vec!["pkg:maven/com.example/lib@1.0.0".to_string()])
        );
        assert!(status.errors.is_none());
    }

    #[test]
    fn test_status_response_minimal() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"deploymentId":"d","deploymentState":"PENDING"}"#).unwrap();

        assert_eq!(status.deployment_state, DeploymentState::Pending);
        assert!(status.deployment_name.is_none());
        assert!(status.failure_reasons().is_empty());
    }

    #[test]
    fn test_failure_reasons_flatten_categories() {
        let json = r#"{
            "deploymentId": "d",
            "deploymentState": "FAILED",
            "errors": {"a": ["x"], "b": ["y", "z"]}
        }"#;

        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.failure_reasons(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_failure_reasons_keep_server_category_order() {
        let json = r#"{
            "deploymentId": "d",
            "deploymentState": "FAILED",
            "errors": {"zeta": ["first"], "alpha": ["second", "third"]}
        }"#;

        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.failure_reasons(), vec!["first", "second", "third"]);

        let err = PortalError::DeploymentFailed {
            deployment_id: "d".to_string(),
            reasons: status.failure_reasons(),
        };
        assert_eq!(
            err.to_string(),
            "deployment d FAILED\n- first\n- second\n- third"
        );
    }

    #[test]
    fn test_poll_config_rejects_zero_interval() {
        let result = PollConfig::new(Duration::ZERO, Duration::from_secs(60));
        assert!(matches!(result, Err(PortalError::Configuration(_))));
    }

    #[test]
    fn test_poll_config_defaults() {
        assert_eq!(PollConfig::VALIDATION.poll_interval(), Duration::from_secs(15));
        assert_eq!(PollConfig::VALIDATION.timeout(), Duration::from_secs(2700));
        assert_eq!(PollConfig::PUBLICATION.poll_interval(), Duration::from_secs(30));
        assert_eq!(PollConfig::PUBLICATION.timeout(), Duration::from_secs(5400));
        assert_eq!(PollConfig::PUBLICATION.max_consecutive_failures(), 0);
    }

    #[test]
    fn test_bundle_defaults_name_to_file_name() {
        let bundle = Bundle::new("/tmp/build/central-bundle.zip");
        assert_eq!(bundle.deployment_name(), "central-bundle.zip");

        let bundle = bundle.with_deployment_name("release-1.2.3");
        assert_eq!(bundle.deployment_name(), "release-1.2.3");
    }

    #[tokio::test]
    async fn test_bundle_validate_accepts_non_empty_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"PK\x03\x04").unwrap();

        let size = Bundle::new(file.path()).validate().await.unwrap();
        assert_eq!(size, 4);
    }

    #[tokio::test]
    async fn test_bundle_validate_rejects_empty_file() {
        let file = NamedTempFile::new().unwrap();

        let result = Bundle::new(file.path()).validate().await;
        assert!(matches!(result, Err(PortalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bundle_validate_rejects_missing_file_and_directory() {
        let dir = TempDir::new().unwrap();

        let missing = Bundle::new(dir.path().join("missing.zip")).validate().await;
        assert!(matches!(missing, Err(PortalError::Validation(_))));

        let directory = Bundle::new(dir.path()).validate().await;
        assert!(matches!(directory, Err(PortalError::Validation(_))));
    }

    #[test]
    fn test_publishing_type_wire_names() {
        assert_eq!(PublishingType::default().as_str(), "AUTOMATIC");
        let parsed: PublishingType = serde_yaml::from_str("USER_MANAGED").unwrap();
        assert_eq!(parsed, PublishingType::UserManaged);
    }
}
