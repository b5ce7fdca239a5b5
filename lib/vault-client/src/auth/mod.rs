mod approle;
mod manager;
mod token;
mod token_info;

pub use approle::AppRoleAuth;
pub use manager::TokenManager;
pub use token::StaticTokenAuth;
pub use token_info::TokenInfo;

use crate::VaultError;
use crate::transport::HttpTransport;
use async_trait::async_trait;

/// Trait for authentication methods
#[async_trait]
pub trait AuthMethod: Send + Sync {
    /// Perform a login exchange
    async fn authenticate(&self, transport: &HttpTransport) -> Result<TokenInfo, VaultError>;

    /// Token known without a login round trip
    fn preset_token(&self) -> Option<TokenInfo> {
        None
    }

    /// Method name for logging
    fn name(&self) -> &'static str;
}
