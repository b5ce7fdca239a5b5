use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use vault_client::{SecretDocument, SecretPath, VaultClient, VaultError};

use super::{parse_port, required, CredentialProvider, DB_HOST, DB_PORT, DB_SID};
use crate::credentials::DbCredentials;
use crate::error::Result;
use crate::settings::{lookup, FieldNames};

/// Credentials from a Vault KV secret.
///
/// Username and password must be in the secret. Host, port and sid fall back
/// to `DB_*` variables when the secret does not carry them.
pub struct VaultProvider {
    client: VaultClient,
    path: SecretPath,
    fields: FieldNames,
    environ: HashMap<String, String>,
}

impl VaultProvider {
    pub fn new(
        client: VaultClient,
        path: SecretPath,
        fields: FieldNames,
        environ: HashMap<String, String>,
    ) -> Self {
        Self {
            client,
            path,
            fields,
            environ,
        }
    }

    fn secret_field(&self, document: &SecretDocument, key: &str) -> Result<String> {
        non_empty(document, key).ok_or_else(|| {
            VaultError::FieldNotFound {
                path: self.path.resolve(),
                key: key.to_string(),
            }
            .into()
        })
    }

    fn field_or_env(&self, document: &SecretDocument, key: &str, var: &str) -> Option<String> {
        non_empty(document, key).or_else(|| lookup(&self.environ, &[var]))
    }
}

fn non_empty(document: &SecretDocument, key: &str) -> Option<String> {
    document
        .get(key)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

#[async_trait]
impl CredentialProvider for VaultProvider {
    async fn load(&self) -> Result<DbCredentials> {
        tracing::debug!(path = %self.path, "Load credentials from Vault ...");
        let document = self.client.read_document(&self.path).await?;

        let user = self.secret_field(&document, &self.fields.username)?;
        let password = self.secret_field(&document, &self.fields.password)?;

        let host = match self.field_or_env(&document, &self.fields.host, DB_HOST) {
            Some(host) => host,
            None => required(&self.environ, DB_HOST)?,
        };
        let sid = match self.field_or_env(&document, &self.fields.sid, DB_SID) {
            Some(sid) => sid,
            None => required(&self.environ, DB_SID)?,
        };
        let port = parse_port(self.field_or_env(&document, &self.fields.port, DB_PORT))?;

        Ok(DbCredentials {
            host,
            port,
            sid,
            user,
            password: SecretString::from(password),
        })
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}
