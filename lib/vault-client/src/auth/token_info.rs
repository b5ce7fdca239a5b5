use secrecy::SecretString;
use std::time::Duration;

/// Token obtained from authentication.
///
/// Lease details are reported by Vault at login and only logged; the cached
/// token is kept until the client is reset.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub token: SecretString,
    pub lease_duration: Duration,
    pub renewable: bool,
}

impl TokenInfo {
    pub fn new(token: SecretString, lease_duration: Duration, renewable: bool) -> Self {
        Self {
            token,
            lease_duration,
            renewable,
        }
    }

    /// Static token (no known lease)
    pub fn static_token(token: SecretString) -> Self {
        Self::new(token, Duration::ZERO, false)
    }
}
