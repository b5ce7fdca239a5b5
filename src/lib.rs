//! Database credentials for test runs, resolved from a local env file,
//! injected process variables or a HashiCorp Vault KV secret.

mod context;
mod credentials;
mod error;
mod providers;
mod settings;

pub use context::{select_source, Source};
pub use credentials::{CredentialsView, DbCredentials, DEFAULT_DB_PORT};
pub use error::{CredentialsError, Result};
pub use providers::{CredentialProvider, EnvFileProvider, EnvProvider, VaultProvider};
pub use settings::{FieldNames, Settings, VaultSettings};

/// Provider for the given source.
///
/// The Vault client is built here so configuration errors surface before any
/// request is made.
pub fn build_provider(settings: &Settings, source: Source) -> Result<Box<dyn CredentialProvider>> {
    match source {
        Source::EnvFile => Ok(Box::new(EnvFileProvider::new(
            settings.env_file.clone(),
            settings.environ.clone(),
        ))),
        Source::Process => Ok(Box::new(EnvProvider::new(settings.environ.clone()))),
        Source::Vault => {
            let vault = &settings.vault;
            if !vault.has_credentials() {
                return Err(CredentialsError::Configuration(
                    "Vault source needs VAULT_TOKEN or VAULT_ROLE_ID and VAULT_SECRET_ID".to_string(),
                ));
            }
            let path = vault.secret_path().ok_or_else(|| {
                CredentialsError::Configuration("Vault source needs VAULT_DB_SECRET_PATH".to_string())
            })?;
            let client = vault.client_builder().build()?;
            Ok(Box::new(VaultProvider::new(
                client,
                path,
                vault.fields.clone(),
                settings.environ.clone(),
            )))
        }
    }
}

/// Selects the source, then loads credentials from it
pub async fn resolve_credentials(settings: &Settings) -> Result<DbCredentials> {
    let source = select_source(settings);
    let provider = build_provider(settings, source)?;
    tracing::info!(source = provider.name(), "Resolving database credentials");

    match provider.load().await {
        Ok(credentials) => {
            tracing::info!(
                source = provider.name(),
                user = %credentials.user,
                connect = %credentials.connect_string(),
                "Database credentials resolved"
            );
            Ok(credentials)
        }
        Err(e) => {
            tracing::warn!(source = provider.name(), "Credentials resolution failed: {}", e);
            Err(e)
        }
    }
}
