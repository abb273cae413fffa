//! Configuration structures and types for portal-publisher
//!
//! This module provides type-safe configuration management with serde support.
//! Every field has a default, so an empty file (or no file) is a valid config.

use crate::core::error::Result;
use crate::core::traits::{PollConfig, PublishingType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default portal endpoint
pub const DEFAULT_BASE_URL: &str = "https://central.sonatype.com";

/// Default environment variable holding the portal username
pub const DEFAULT_USERNAME_ENV: &str = "SONATYPE_CENTRAL_PORTAL_USERNAME";

/// Default environment variable holding the portal password
pub const DEFAULT_PASSWORD_ENV: &str = "SONATYPE_CENTRAL_PORTAL_PASSWORD";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalConfig {
    /// Portal base URL; may reference `${VAR}` environment variables
    pub base_url: String,

    /// Where credentials are read from
    pub credentials: CredentialsConfig,

    /// HTTP client settings
    pub transport: TransportConfig,

    /// Release behaviour once a deployment validates
    pub publishing_type: PublishingType,

    /// Wait settings for `publish`
    pub publish: WaitConfig,

    /// Wait settings for `wait-for-publication`
    pub wait_for_publication: WaitConfig,

    /// Consecutive transient status failures tolerated while polling (default: 0)
    pub max_consecutive_poll_failures: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: CredentialsConfig::default(),
            transport: TransportConfig::default(),
            publishing_type: PublishingType::default(),
            publish: WaitConfig::from(PollConfig::VALIDATION),
            wait_for_publication: WaitConfig::from(PollConfig::PUBLICATION),
            max_consecutive_poll_failures: 0,
        }
    }
}

impl PortalConfig {
    /// Poll settings for the publish workflow
    pub fn publish_poll(&self) -> Result<PollConfig> {
        self.publish.to_poll_config(self.max_consecutive_poll_failures)
    }

    /// Poll settings for the wait-for-publication workflow
    pub fn publication_poll(&self) -> Result<PollConfig> {
        self.wait_for_publication
            .to_poll_config(self.max_consecutive_poll_failures)
    }
}

/// Names of the environment variables holding credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialsConfig {
    pub username_env: String,
    pub password_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username_env: DEFAULT_USERNAME_ENV.to_string(),
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
    /// TCP/TLS connect timeout (default: 30s)
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Maximum idle time between response reads (default: 60s)
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Bound on a whole request, bundle upload included (default: 120s)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Attempts per request when the connection cannot be established (default: 3)
    pub connection_retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(120),
            connection_retries: 3,
        }
    }
}

/// Poll cadence and bound for one workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WaitConfig {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl From<PollConfig> for WaitConfig {
    fn from(poll: PollConfig) -> Self {
        Self {
            poll_interval: poll.poll_interval(),
            timeout: poll.timeout(),
        }
    }
}

impl WaitConfig {
    fn to_poll_config(self, max_consecutive_failures: u32) -> Result<PollConfig> {
        Ok(PollConfig::new(self.poll_interval, self.timeout)?
            .with_max_consecutive_failures(max_consecutive_failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PortalError;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();

        assert_eq!(config.base_url, "https://central.sonatype.com");
        assert_eq!(config.credentials.username_env, "SONATYPE_CENTRAL_PORTAL_USERNAME");
        assert_eq!(config.credentials.password_env, "SONATYPE_CENTRAL_PORTAL_PASSWORD");
        assert_eq!(config.transport.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.publishing_type, PublishingType::Automatic);
        assert_eq!(config.publish_poll().unwrap(), PollConfig::VALIDATION);
        assert_eq!(config.publication_poll().unwrap(), PollConfig::PUBLICATION);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config: PortalConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PortalConfig::default());
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
baseUrl: https://portal.example.com
credentials:
  usernameEnv: PORTAL_USER
publishingType: USER_MANAGED
transport:
  connectTimeout: 5s
  connectionRetries: 1
publish:
  pollInterval: 5s
  timeout: 10m
maxConsecutivePollFailures: 2
"#;

        let config: PortalConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.base_url, "https://portal.example.com");
        assert_eq!(config.credentials.username_env, "PORTAL_USER");
        assert_eq!(config.credentials.password_env, DEFAULT_PASSWORD_ENV);
        assert_eq!(config.publishing_type, PublishingType::UserManaged);
        assert_eq!(config.transport.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.transport.read_timeout, Duration::from_secs(60));
        assert_eq!(config.transport.connection_retries, 1);

        let poll = config.publish_poll().unwrap();
        assert_eq!(poll.poll_interval(), Duration::from_secs(5));
        assert_eq!(poll.timeout(), Duration::from_secs(600));
        assert_eq!(poll.max_consecutive_failures(), 2);

        assert_eq!(config.publication_poll().unwrap().timeout(), Duration::from_secs(5400));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let yaml = "publish:\n  pollInterval: 0s\n  timeout: 1m\n";
        let config: PortalConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(
            config.publish_poll(),
            Err(PortalError::Configuration(_))
        ));
    }
}
