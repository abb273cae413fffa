//! Portal credentials and the authorization token derived from them
//!
//! Credentials come from a [`CredentialProvider`]; the environment lookup is
//! one implementation. They are consumed into an [`AuthToken`] immediately,
//! using the `secrecy` crate so the secret never shows up in logs or `Debug`
//! output.

use crate::core::config::CredentialsConfig;
use crate::core::error::{PortalError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fmt;

/// A portal user token pair
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials, rejecting blank values
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(PortalError::Configuration("username is blank".to_string()));
        }
        if password.trim().is_empty() {
            return Err(PortalError::Configuration("password is blank".to_string()));
        }

        Ok(Self {
            username,
            password: SecretString::from(password),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Source of portal credentials
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}

/// Reads credentials from two named environment variables
///
/// # Examples
///
/// ```
/// use portal_publisher::security::{CredentialProvider, EnvCredentialProvider};
///
/// let provider = EnvCredentialProvider::new("MY_PORTAL_USER", "MY_PORTAL_PASSWORD");
/// if provider.credentials().is_err() {
///     println!("portal credentials are not configured");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    username_var: String,
    password_var: String,
}

impl EnvCredentialProvider {
    pub fn new(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self::new(&config.username_env, &config.password_env)
    }

    fn read(name: &str) -> Result<String> {
        env::var(name)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| PortalError::Configuration(format!("{} not configured", name)))
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::from_config(&CredentialsConfig::default())
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Result<Credentials> {
        let username = Self::read(&self.username_var)?;
        let password = Self::read(&self.password_var)?;
        Credentials::new(username, password)
    }
}

/// Fixed credentials, for callers that resolve secrets themselves
pub struct StaticCredentialProvider {
    username: String,
    password: SecretString,
}

impl StaticCredentialProvider {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Result<Credentials> {
        Credentials::new(self.username.clone(), self.password.expose_secret())
    }
}

/// The `Authorization` header value sent with every portal request
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Encode `user:password` as a bearer token
    ///
    /// # Examples
    ///
    /// ```
    /// use portal_publisher::security::{AuthToken, Credentials};
    ///
    /// let creds = Credentials::new("user", "pass").unwrap();
    /// let token = AuthToken::from_credentials(creds);
    /// assert_eq!(token.header_value(), "Bearer dXNlcjpwYXNz");
    /// ```
    pub fn from_credentials(credentials: Credentials) -> Self {
        let raw = format!(
            "{}:{}",
            credentials.username,
            credentials.password.expose_secret()
        );
        let encoded = STANDARD.encode(raw.as_bytes());
        Self(SecretString::from(format!("Bearer {}", encoded)))
    }

    pub fn from_provider(provider: &dyn CredentialProvider) -> Result<Self> {
        provider.credentials().map(Self::from_credentials)
    }

    pub fn header_value(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken({})", mask_token(self.0.expose_secret()))
    }
}

/// Masks a token for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Tokens shorter than 10 characters are fully masked as "****".
pub fn mask_token(token: &str) -> String {
    if token.len() < 10 || !token.is_char_boundary(3) || !token.is_char_boundary(token.len() - 3) {
        return "****".to_string();
    }

    let prefix = &token[..3];
    let suffix = &token[token.len() - 3..];
    format!("{}...{}", prefix, suffix)
}
