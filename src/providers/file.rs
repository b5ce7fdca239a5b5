use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::read_to_string;

use super::{credentials_from_vars, CredentialProvider};
use crate::credentials::DbCredentials;
use crate::error::{CredentialsError, Result};

/// Credentials from a local dotenv file.
///
/// Like `dotenv`, values already present in the process environment are not
/// overridden by the file.
pub struct EnvFileProvider {
    path: PathBuf,
    environ: HashMap<String, String>,
}

impl EnvFileProvider {
    pub fn new(path: impl Into<PathBuf>, environ: HashMap<String, String>) -> Self {
        Self {
            path: path.into(),
            environ,
        }
    }

    async fn read_file(&self) -> Result<HashMap<String, String>> {
        let contents = read_to_string(&self.path)
            .await
            .map_err(|e| CredentialsError::EnvFile {
                path: self.path.clone(),
                source: dotenvy::Error::Io(e),
            })?;

        dotenvy::from_read_iter(contents.as_bytes())
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(|source| CredentialsError::EnvFile {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl CredentialProvider for EnvFileProvider {
    async fn load(&self) -> Result<DbCredentials> {
        tracing::debug!("Load credentials from env file {:?} ...", &self.path);
        let mut vars = self.read_file().await?;
        vars.extend(
            self.environ
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        credentials_from_vars(&vars)
    }

    fn name(&self) -> &'static str {
        "env-file"
    }
}
