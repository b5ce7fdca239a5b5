use super::{AuthMethod, TokenInfo};
use crate::VaultError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use secrecy::SecretString;

/// Static token authentication
pub struct StaticTokenAuth {
    token: SecretString,
}

impl StaticTokenAuth {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthMethod for StaticTokenAuth {
    async fn authenticate(&self, _transport: &HttpTransport) -> Result<TokenInfo, VaultError> {
        Ok(TokenInfo::static_token(self.token.clone()))
    }

    fn preset_token(&self) -> Option<TokenInfo> {
        Some(TokenInfo::static_token(self.token.clone()))
    }

    fn name(&self) -> &'static str {
        "token"
    }
}
