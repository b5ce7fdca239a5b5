use super::{AuthMethod, TokenInfo};
use crate::config::DEFAULT_APPROLE_MOUNT;
use crate::error::{AuthError, Operation, VaultError};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// AppRole authentication: role_id + secret_id exchanged for a client token
pub struct AppRoleAuth {
    pub role_id: String,
    secret_id: SecretString,
    pub mount: String,
}

impl AppRoleAuth {
    pub fn new(role_id: String, secret_id: SecretString) -> Self {
        Self {
            role_id,
            secret_id,
            mount: DEFAULT_APPROLE_MOUNT.to_string(),
        }
    }

    pub fn with_mount(mut self, mount: String) -> Self {
        self.mount = mount;
        self
    }

    fn login_path(&self) -> String {
        format!("auth/{}/login", self.mount.trim_matches('/'))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    role_id: &'a str,
    secret_id: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<AuthData>,
}

#[derive(Deserialize)]
struct AuthData {
    client_token: Option<String>,
    #[serde(default)]
    lease_duration: u64,
    #[serde(default)]
    renewable: bool,
}

#[async_trait]
impl AuthMethod for AppRoleAuth {
    async fn authenticate(&self, transport: &HttpTransport) -> Result<TokenInfo, VaultError> {
        let request = transport
            .request(Method::POST, &self.login_path())
            .json(&LoginRequest {
                role_id: &self.role_id,
                secret_id: self.secret_id.expose_secret(),
            });

        let response = transport.send(Operation::Login, request).await?;

        if !response.status.is_success() {
            return Err(AuthError::Rejected {
                status: response.status.as_u16(),
                body: response.body,
            }
            .into());
        }

        let login: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| VaultError::InvalidResponse(format!("login response: {}", e)))?;

        let auth = login.auth.ok_or(AuthError::NoToken)?;
        let token = auth
            .client_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NoToken)?;

        Ok(TokenInfo::new(
            SecretString::from(token),
            Duration::from_secs(auth.lease_duration),
            auth.renewable,
        ))
    }

    fn name(&self) -> &'static str {
        "approle"
    }
}
