//! Startup settings, resolved once from an environment map.
//!
//! Every setting that may come from more than one variable lists its names
//! here in precedence order; the first non-empty value wins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use vault_client::{KvEngine, SecretPath, VaultClient, VaultClientBuilder, DEFAULT_APPROLE_MOUNT};

use crate::context::Source;
use crate::error::{CredentialsError, Result};

const SOURCE: &[&str] = &["CREDENTIALS_SOURCE"];
const ENV_FILE: &[&str] = &["CREDENTIALS_ENV_FILE"];
const VAULT_ADDR: &[&str] = &["VAULT_ADDR", "VAULT_URL"];
const VAULT_ROLE_ID: &[&str] = &["VAULT_ROLE_ID", "ROLE_ID"];
const VAULT_SECRET_ID: &[&str] = &["VAULT_SECRET_ID", "SECRET_ID"];
const VAULT_TOKEN: &[&str] = &["VAULT_TOKEN"];
const VAULT_NAMESPACE: &[&str] = &["VAULT_NAMESPACE"];
const VAULT_TIMEOUT_MS: &[&str] = &["VAULT_TIMEOUT_MS"];
const VAULT_AUTH_MOUNT: &[&str] = &["VAULT_AUTH_MOUNT"];
const VAULT_KV_MOUNT: &[&str] = &["VAULT_KV_MOUNT"];
const VAULT_KV_VERSION: &[&str] = &["VAULT_KV_VERSION"];
const VAULT_SECRET_PATH: &[&str] = &["VAULT_DB_SECRET_PATH"];
const FIELD_USERNAME: &[&str] = &["VAULT_FIELD_USERNAME"];
const FIELD_PASSWORD: &[&str] = &["VAULT_FIELD_PASSWORD"];
const FIELD_HOST: &[&str] = &["VAULT_FIELD_HOST"];
const FIELD_PORT: &[&str] = &["VAULT_FIELD_PORT"];
const FIELD_SID: &[&str] = &["VAULT_FIELD_SID"];

const DEFAULT_ENV_FILE: &str = ".env";
const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";
const DEFAULT_VAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_KV_MOUNT: &str = "secret";

/// Names of the secret document fields holding each credential part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub sid: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            username: "username".to_string(),
            password: "password".to_string(),
            host: "host".to_string(),
            port: "port".to_string(),
            sid: "sid".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub role_id: Option<String>,
    pub secret_id: Option<SecretString>,
    pub token: Option<SecretString>,
    pub namespace: Option<String>,
    pub timeout: Duration,
    pub auth_mount: String,
    pub kv_mount: String,
    pub kv_engine: KvEngine,
    pub secret_path: Option<String>,
    pub fields: FieldNames,
}

impl VaultSettings {
    pub fn has_credentials(&self) -> bool {
        self.token.is_some() || (self.role_id.is_some() && self.secret_id.is_some())
    }

    pub fn secret_path(&self) -> Option<SecretPath> {
        self.secret_path
            .as_ref()
            .map(|sub_path| SecretPath::new(self.kv_mount.clone(), sub_path.clone(), self.kv_engine))
    }

    /// A static token takes precedence over AppRole ids when both are present
    pub fn client_builder(&self) -> VaultClientBuilder {
        use secrecy::ExposeSecret;

        let mut builder = VaultClient::builder()
            .address(self.address.clone())
            .timeout(self.timeout)
            .approle_mount(self.auth_mount.clone());

        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace.clone());
        }

        match (&self.token, &self.role_id, &self.secret_id) {
            (Some(token), _, _) => builder.token(token.expose_secret()),
            (None, Some(role_id), Some(secret_id)) => {
                builder.app_role(role_id.clone(), secret_id.expose_secret())
            }
            _ => builder,
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pub source: Option<Source>,
    pub env_file: PathBuf,
    pub vault: VaultSettings,
    pub environ: HashMap<String, String>,
}

impl Settings {
    /// Settings from the actual process environment
    pub fn from_env() -> Result<Self> {
        Self::from_environ(std::env::vars().collect())
    }

    /// Settings from a custom environment (for testing)
    pub fn from_environ(environ: HashMap<String, String>) -> Result<Self> {
        let source = lookup(&environ, SOURCE)
            .map(|value| value.parse::<Source>())
            .transpose()?;

        let timeout_ms = parse_number(&environ, VAULT_TIMEOUT_MS)?.unwrap_or(DEFAULT_VAULT_TIMEOUT_MS);
        let kv_engine = match parse_number::<u8>(&environ, VAULT_KV_VERSION)? {
            None => KvEngine::default(),
            Some(version) => KvEngine::from_version(version).ok_or_else(|| {
                CredentialsError::Configuration(format!("unsupported KV version {}", version))
            })?,
        };

        let defaults = FieldNames::default();
        let fields = FieldNames {
            username: setting(&environ, FIELD_USERNAME).unwrap_or(defaults.username),
            password: setting(&environ, FIELD_PASSWORD).unwrap_or(defaults.password),
            host: setting(&environ, FIELD_HOST).unwrap_or(defaults.host),
            port: setting(&environ, FIELD_PORT).unwrap_or(defaults.port),
            sid: setting(&environ, FIELD_SID).unwrap_or(defaults.sid),
        };

        let vault = VaultSettings {
            address: lookup(&environ, VAULT_ADDR).unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string()),
            role_id: lookup(&environ, VAULT_ROLE_ID),
            secret_id: lookup(&environ, VAULT_SECRET_ID).map(SecretString::from),
            token: lookup(&environ, VAULT_TOKEN).map(SecretString::from),
            namespace: setting(&environ, VAULT_NAMESPACE),
            timeout: Duration::from_millis(timeout_ms),
            auth_mount: setting(&environ, VAULT_AUTH_MOUNT)
                .unwrap_or_else(|| DEFAULT_APPROLE_MOUNT.to_string()),
            kv_mount: setting(&environ, VAULT_KV_MOUNT).unwrap_or_else(|| DEFAULT_KV_MOUNT.to_string()),
            kv_engine,
            secret_path: setting(&environ, VAULT_SECRET_PATH),
            fields,
        };

        Ok(Self {
            source,
            env_file: setting(&environ, ENV_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE)),
            vault,
            environ,
        })
    }
}

/// First value among `keys` that is not blank, in order. The value itself is
/// returned untouched; passwords may carry significant whitespace.
pub(crate) fn lookup(environ: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| environ.get(*key))
        .find(|value| !value.trim().is_empty())
        .cloned()
}

/// Like [`lookup`], trimmed; for names and paths rather than secrets
fn setting(environ: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    lookup(environ, keys).map(|value| value.trim().to_string())
}

fn parse_number<T: std::str::FromStr>(
    environ: &HashMap<String, String>,
    keys: &[&str],
) -> Result<Option<T>> {
    lookup(environ, keys)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| {
                CredentialsError::Configuration(format!("{} is not a valid number: {}", keys[0], value))
            })
        })
        .transpose()
}
