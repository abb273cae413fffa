//! Configuration file loader for portal-publisher
//!
//! This module provides configuration loading, overriding and validation.

use super::config::*;
use crate::core::error::{PortalError, Result};
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name looked up in the project directory
pub const CONFIG_FILENAME: &str = ".portal-publisher.yaml";

/// Environment variable overriding `baseUrl`
pub const BASE_URL_ENV: &str = "PORTAL_PUBLISHER_BASE_URL";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Directory searched for `.portal-publisher.yaml`
    pub project_path: PathBuf,

    /// Explicit config file; must exist when given
    pub config_file: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub overrides: ConfigOverrides,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for `project_path` using the process environment
    pub fn from_env<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            config_file: None,
            overrides: ConfigOverrides::default(),
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Explicit config file, else project config (./.portal-publisher.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PortalConfig> {
        let mut config = match &options.config_file {
            Some(path) => Self::load_config_file(path).await?.ok_or_else(|| {
                PortalError::Configuration(format!("config file not found: {}", path.display()))
            })?,
            None => Self::load_config_file(&options.project_path.join(CONFIG_FILENAME))
                .await?
                .unwrap_or_default(),
        };

        if let Some(base_url) = options.env.get(BASE_URL_ENV) {
            config.base_url = base_url.clone();
        }

        if let Some(base_url) = options.overrides.base_url {
            config.base_url = base_url;
        }

        config.base_url = Self::expand_string(&config.base_url, &options.env)?;
        Self::validate(&config)?;

        tracing::debug!(base_url = %config.base_url, "loaded portal configuration");
        Ok(config)
    }

    /// Load configuration from a YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<PortalConfig>> {
        if !fs::try_exists(file_path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await?;

        let config: PortalConfig = serde_yaml::from_str(&content).map_err(|e| {
            PortalError::Configuration(format!(
                "failed to parse {}: {}",
                file_path.display(),
                e
            ))
        })?;

        Ok(Some(config))
    }

    /// Expand `${VAR}` references; an unset variable is an error
    fn expand_string(input: &str, env: &HashMap<String, String>) -> Result<String> {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| PortalError::Configuration(e.to_string()))?;

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];
            let value = env.get(var_name).ok_or_else(|| {
                PortalError::Configuration(format!(
                    "environment variable {} referenced in config is not set",
                    var_name
                ))
            })?;
            result = result.replace(&cap[0], value);
        }

        Ok(result)
    }

    /// Validate configuration
    pub fn validate(config: &PortalConfig) -> Result<()> {
        let url = Url::parse(&config.base_url).map_err(|e| {
            PortalError::Configuration(format!("invalid baseUrl {:?}: {}", config.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PortalError::Configuration(format!(
                "baseUrl must be http or https, got {}",
                url.scheme()
            )));
        }

        if config.credentials.username_env.trim().is_empty()
            || config.credentials.password_env.trim().is_empty()
        {
            return Err(PortalError::Configuration(
                "credentials.usernameEnv and credentials.passwordEnv must not be empty".to_string(),
            ));
        }

        config.publish_poll()?;
        config.publication_poll()?;

        Ok(())
    }
}
