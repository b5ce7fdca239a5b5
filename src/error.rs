use std::path::PathBuf;
use thiserror::Error;
use vault_client::VaultError;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Failed to load env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Required variable {0} is not set")]
    MissingVariable(String),

    #[error("Invalid database port: {value}")]
    InvalidPort { value: String },

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CredentialsError>;
