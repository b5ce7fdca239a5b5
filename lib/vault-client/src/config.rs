use crate::error::VaultError;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_APPROLE_MOUNT: &str = "approle";

/// How the client obtains its Vault token
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Exchange role/secret ids for a token on first use
    AppRole {
        role_id: String,
        secret_id: SecretString,
        mount: String,
    },
    /// Token supplied directly, no login round trip
    Token(SecretString),
}

/// Immutable settings for reaching Vault
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub address: String,
    pub namespace: Option<String>,
    pub timeout: Duration,
    pub credentials: Credentials,
}

impl AuthConfig {
    pub fn app_role(
        address: impl Into<String>,
        role_id: impl Into<String>,
        secret_id: impl Into<String>,
    ) -> Self {
        Self::with_credentials(
            address,
            Credentials::AppRole {
                role_id: role_id.into(),
                secret_id: SecretString::from(secret_id.into()),
                mount: DEFAULT_APPROLE_MOUNT.to_string(),
            },
        )
    }

    pub fn token(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_credentials(address, Credentials::Token(SecretString::from(token.into())))
    }

    fn with_credentials(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: normalize_address(&address.into()),
            namespace: None,
            timeout: DEFAULT_TIMEOUT,
            credentials,
        }
    }

    /// Empty namespaces are treated as absent
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fails before any request is issued when required values are missing
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.address.is_empty() {
            return Err(VaultError::Configuration("Vault address is empty".into()));
        }
        if !self.address.starts_with("http://") && !self.address.starts_with("https://") {
            return Err(VaultError::Configuration(format!(
                "Vault address must be an http(s) URL: {}",
                self.address
            )));
        }
        if self.timeout.is_zero() {
            return Err(VaultError::Configuration("timeout must be positive".into()));
        }

        match &self.credentials {
            Credentials::AppRole {
                role_id,
                secret_id,
                mount,
            } => {
                if role_id.is_empty() {
                    return Err(VaultError::Configuration("AppRole role_id is empty".into()));
                }
                if secret_id.expose_secret().is_empty() {
                    return Err(VaultError::Configuration("AppRole secret_id is empty".into()));
                }
                if mount.trim_matches('/').is_empty() {
                    return Err(VaultError::Configuration("AppRole mount is empty".into()));
                }
            }
            Credentials::Token(token) => {
                if token.expose_secret().is_empty() {
                    return Err(VaultError::Configuration("Vault token is empty".into()));
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn normalize_address(address: &str) -> String {
    address.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_stripped() {
        let config = AuthConfig::token("http://vault:8200///", "t");
        assert_eq!(config.address, "http://vault:8200");
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::app_role("http://vault:8200", "role", "secret");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert!(config.namespace.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_namespace_is_absent() {
        let config = AuthConfig::token("http://vault:8200", "t").with_namespace("");
        assert!(config.namespace.is_none());

        let config = AuthConfig::token("http://vault:8200", "t").with_namespace("team-qa");
        assert_eq!(config.namespace.as_deref(), Some("team-qa"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = AuthConfig::app_role("http://vault:8200", "", "secret");
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));

        let config = AuthConfig::app_role("http://vault:8200", "role", "");
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));

        let config = AuthConfig::token("http://vault:8200", "");
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_bad_address_rejected() {
        let config = AuthConfig::token("", "t");
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));

        let config = AuthConfig::token("vault:8200", "t");
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AuthConfig::token("http://vault:8200", "t").with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(VaultError::Configuration(_))));
    }
}
