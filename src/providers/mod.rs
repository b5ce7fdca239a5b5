use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::credentials::{DbCredentials, DEFAULT_DB_PORT};
use crate::error::{CredentialsError, Result};
use crate::settings::lookup;

mod env;
mod file;
mod vault;

pub use env::EnvProvider;
pub use file::EnvFileProvider;
pub use vault::VaultProvider;

pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_SID: &str = "DB_SID";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";

/// Trait for credential sources
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn load(&self) -> Result<DbCredentials>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Builds credentials from `DB_*` variables
pub(crate) fn credentials_from_vars(vars: &HashMap<String, String>) -> Result<DbCredentials> {
    Ok(DbCredentials {
        host: required(vars, DB_HOST)?,
        port: parse_port(lookup(vars, &[DB_PORT]))?,
        sid: required(vars, DB_SID)?,
        user: required(vars, DB_USER)?,
        password: SecretString::from(required(vars, DB_PASSWORD)?),
    })
}

pub(crate) fn required(vars: &HashMap<String, String>, key: &str) -> Result<String> {
    lookup(vars, &[key]).ok_or_else(|| CredentialsError::MissingVariable(key.to_string()))
}

pub(crate) fn parse_port(value: Option<String>) -> Result<u16> {
    match value {
        None => Ok(DEFAULT_DB_PORT),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| CredentialsError::InvalidPort { value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_credentials_from_vars() {
        let creds = credentials_from_vars(&vars(&[
            ("DB_HOST", "db.qa.local"),
            ("DB_PORT", "1522"),
            ("DB_SID", "QA1"),
            ("DB_USER", "qa_user"),
            ("DB_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(creds.connect_string(), "db.qa.local:1522/QA1");
        assert_eq!(creds.user, "qa_user");
        assert_eq!(creds.password.expose_secret(), "pw");
    }

    #[test]
    fn test_default_port() {
        assert_eq!(parse_port(None).unwrap(), 1521);
    }

    #[test]
    fn test_padded_port() {
        assert_eq!(parse_port(Some(" 1522 ".to_string())).unwrap(), 1522);
    }

    #[test]
    fn test_invalid_port() {
        let err = parse_port(Some("ninety".to_string())).unwrap_err();
        assert!(matches!(err, CredentialsError::InvalidPort { .. }));
        assert!(parse_port(Some("70000".to_string())).is_err());
    }

    #[test]
    fn test_missing_variable_named() {
        let err = credentials_from_vars(&vars(&[("DB_HOST", "h"), ("DB_SID", "s"), ("DB_USER", "u")]))
            .unwrap_err();
        match err {
            CredentialsError::MissingVariable(name) => assert_eq!(name, "DB_PASSWORD"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
