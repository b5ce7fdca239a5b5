use crate::auth::{AppRoleAuth, AuthMethod, StaticTokenAuth, TokenManager};
use crate::config::{AuthConfig, Credentials, DEFAULT_APPROLE_MOUNT, DEFAULT_TIMEOUT, normalize_address};
use crate::error::{Operation, VaultError};
use crate::models::{SecretDocument, SecretPath, unwrap_envelope};
use crate::transport::{HttpTransport, TOKEN_HEADER, cancellable};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct VaultClientBuilder {
    address: Option<String>,
    namespace: Option<String>,
    timeout: Duration,
    token: Option<String>,
    role_id: Option<String>,
    secret_id: Option<String>,
    approle_mount: String,
    http: Option<reqwest::Client>,
}

impl Default for VaultClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultClientBuilder {
    pub fn new() -> Self {
        Self {
            address: None,
            namespace: None,
            timeout: DEFAULT_TIMEOUT,
            token: None,
            role_id: None,
            secret_id: None,
            approle_mount: DEFAULT_APPROLE_MOUNT.to_string(),
            http: None,
        }
    }

    pub fn address(mut self, url: impl Into<String>) -> Self {
        self.address = Some(url.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn app_role(mut self, role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self.secret_id = Some(secret_id.into());
        self
    }

    pub fn approle_mount(mut self, mount: impl Into<String>) -> Self {
        self.approle_mount = mount.into();
        self
    }

    /// Use a preconfigured reqwest client (proxies, custom TLS roots)
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    fn resolve_config(self) -> Result<(AuthConfig, Option<reqwest::Client>), VaultError> {
        let address = self
            .address
            .map(|a| normalize_address(&a))
            .filter(|a| !a.is_empty())
            .ok_or_else(|| VaultError::Configuration("Vault address not set".into()))?;

        let credentials = match (self.token, self.role_id, self.secret_id) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(VaultError::Configuration(
                    "both a static token and AppRole credentials were given".into(),
                ));
            }
            (Some(token), None, None) => Credentials::Token(SecretString::from(token)),
            (None, Some(role_id), Some(secret_id)) => Credentials::AppRole {
                role_id,
                secret_id: SecretString::from(secret_id),
                mount: self.approle_mount,
            },
            (None, _, _) => {
                return Err(VaultError::Configuration(
                    "no Vault credentials: set a token or AppRole role_id/secret_id".into(),
                ));
            }
        };

        let mut config = AuthConfig {
            address,
            namespace: None,
            timeout: self.timeout,
            credentials,
        };
        if let Some(namespace) = self.namespace {
            config = config.with_namespace(namespace);
        }

        Ok((config, self.http))
    }

    pub fn build(self) -> Result<VaultClient, VaultError> {
        let (config, http) = self.resolve_config()?;
        VaultClient::with_http(config, http.unwrap_or_default())
    }
}

/// Vault KV reader with lazy, cached authentication
pub struct VaultClient {
    transport: HttpTransport,
    token_manager: TokenManager,
}

impl VaultClient {
    pub fn builder() -> VaultClientBuilder {
        VaultClientBuilder::new()
    }

    pub fn new(config: AuthConfig) -> Result<Self, VaultError> {
        Self::with_http(config, reqwest::Client::new())
    }

    pub fn with_http(config: AuthConfig, http: reqwest::Client) -> Result<Self, VaultError> {
        config.validate()?;

        let auth_method: Arc<dyn AuthMethod> = match config.credentials {
            Credentials::Token(token) => Arc::new(StaticTokenAuth::new(token)),
            Credentials::AppRole {
                role_id,
                secret_id,
                mount,
            } => Arc::new(AppRoleAuth::new(role_id, secret_id).with_mount(mount)),
        };

        let transport = HttpTransport::new(http, config.address, config.namespace, config.timeout);
        tracing::debug!(
            method = auth_method.name(),
            timeout = ?transport.timeout(),
            "Vault client configured"
        );

        Ok(Self {
            token_manager: TokenManager::new(transport.clone(), auth_method),
            transport,
        })
    }

    /// Returns the cached token, logging in on first use
    pub async fn ensure_token(&self) -> Result<SecretString, VaultError> {
        self.token_manager.get_token(None).await
    }

    /// Forget the cached login so the next call authenticates again
    pub async fn reset(&self) {
        self.token_manager.reset().await;
    }

    pub async fn read_field(&self, path: &SecretPath, key: &str) -> Result<String, VaultError> {
        self.read_field_inner(path, key, None).await
    }

    pub async fn read_field_with_cancel(
        &self,
        path: &SecretPath,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<String, VaultError> {
        self.read_field_inner(path, key, Some(cancel)).await
    }

    pub async fn read_document(&self, path: &SecretPath) -> Result<SecretDocument, VaultError> {
        self.read_raw_inner(&path.resolve(), None).await
    }

    pub async fn read_document_with_cancel(
        &self,
        path: &SecretPath,
        cancel: &CancellationToken,
    ) -> Result<SecretDocument, VaultError> {
        self.read_raw_inner(&path.resolve(), Some(cancel)).await
    }

    /// KV v2 helper: `mount/data/sub_path`
    pub async fn read_kv2(&self, mount: &str, sub_path: &str) -> Result<SecretDocument, VaultError> {
        self.read_document(&SecretPath::kv2(mount, sub_path)).await
    }

    /// KV v1 helper: `mount/sub_path`
    pub async fn read_kv1(&self, mount: &str, sub_path: &str) -> Result<SecretDocument, VaultError> {
        self.read_document(&SecretPath::kv1(mount, sub_path)).await
    }

    /// Read an already resolved path below `/v1/`
    pub async fn read_raw(&self, path: &str) -> Result<SecretDocument, VaultError> {
        self.read_raw_inner(path, None).await
    }

    async fn read_field_inner(
        &self,
        path: &SecretPath,
        key: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, VaultError> {
        let resolved = path.resolve();
        let mut document = self.read_raw_inner(&resolved, cancel).await?;
        document
            .remove(key)
            .ok_or_else(|| VaultError::FieldNotFound {
                path: resolved,
                key: key.to_string(),
            })
    }

    #[tracing::instrument(skip(self, cancel))]
    async fn read_raw_inner(
        &self,
        path: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<SecretDocument, VaultError> {
        let path = path.trim_start_matches('/');
        let token = self.token_manager.get_token(cancel).await?;

        let request = self
            .transport
            .request(Method::GET, path)
            .header(TOKEN_HEADER, token.expose_secret());
        let response = cancellable(
            Operation::Read,
            cancel,
            self.transport.send(Operation::Read, request),
        )
        .await?;

        if !response.status.is_success() {
            tracing::warn!(status = response.status.as_u16(), "Vault read rejected");
            return Err(VaultError::SecretRead {
                path: path.to_string(),
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| VaultError::InvalidResponse(format!("{}: {}", path, e)))?;
        let document = unwrap_envelope(body);
        if document.is_empty() {
            tracing::debug!("Vault response carried no recognizable KV data");
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = VaultClientBuilder::new();
        assert!(builder.address.is_none());
        assert!(builder.token.is_none());
        assert_eq!(builder.timeout, Duration::from_millis(5000));
        assert_eq!(builder.approle_mount, "approle");
    }

    #[test]
    fn test_builder_chain() {
        let builder = VaultClientBuilder::new()
            .address("http://vault:8200/")
            .namespace("qa")
            .app_role("role", "secret");

        assert_eq!(builder.address, Some("http://vault:8200/".to_string()));
        assert_eq!(builder.role_id, Some("role".to_string()));
        assert_eq!(builder.secret_id, Some("secret".to_string()));

        let (config, _) = builder.resolve_config().unwrap();
        assert_eq!(config.address, "http://vault:8200");
        assert_eq!(config.namespace.as_deref(), Some("qa"));
    }

    #[test]
    fn test_build_without_address_fails() {
        let result = VaultClient::builder().token("t").build();
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_build_without_credentials_fails() {
        let result = VaultClient::builder().address("http://vault:8200").build();
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_build_with_both_strategies_fails() {
        let result = VaultClient::builder()
            .address("http://vault:8200")
            .token("t")
            .app_role("role", "secret")
            .build();
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_build_with_partial_approle_fails() {
        let builder = VaultClientBuilder {
            role_id: Some("role".to_string()),
            ..VaultClientBuilder::new().address("http://vault:8200")
        };
        assert!(matches!(builder.build(), Err(VaultError::Configuration(_))));
    }
}
