use super::{AuthMethod, TokenInfo};
use crate::VaultError;
use crate::error::Operation;
use crate::transport::{HttpTransport, cancellable};
use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Session {
    token: Option<TokenInfo>,
    /// Outcome of the most recent completed login, when it failed
    last_failure: Option<(u64, VaultError)>,
}

/// Owns the cached session token.
///
/// The session lock is held for the whole login exchange, so concurrent
/// callers hitting an empty cache wait for the single in-flight login instead
/// of starting their own. Callers that were queued behind a failed login get
/// that failure; a caller arriving after it starts a fresh attempt. A
/// cancelled login completes no attempt and leaves the cache empty.
pub struct TokenManager {
    transport: HttpTransport,
    auth_method: Arc<dyn AuthMethod>,
    session: Mutex<Session>,
    /// Completed login attempts, bumped under the session lock
    attempts: AtomicU64,
}

impl TokenManager {
    pub fn new(transport: HttpTransport, auth_method: Arc<dyn AuthMethod>) -> Self {
        let session = Session {
            token: auth_method.preset_token(),
            last_failure: None,
        };
        Self {
            transport,
            auth_method,
            session: Mutex::new(session),
            attempts: AtomicU64::new(0),
        }
    }

    /// Cached token, logging in first when there is none
    pub async fn get_token(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<SecretString, VaultError> {
        cancellable(Operation::Login, cancel, self.ensure_token()).await
    }

    async fn ensure_token(&self) -> Result<SecretString, VaultError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut session = self.session.lock().await;

        if let Some(info) = session.token.as_ref() {
            return Ok(info.token.clone());
        }
        if let Some((attempt, error)) = &session.last_failure {
            if *attempt > seen {
                return Err(error.clone());
            }
        }

        tracing::debug!(method = self.auth_method.name(), "Logging in to Vault");
        let result = self.auth_method.authenticate(&self.transport).await;
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;

        match result {
            Ok(info) => {
                tracing::info!(
                    method = self.auth_method.name(),
                    lease_secs = info.lease_duration.as_secs(),
                    renewable = info.renewable,
                    "Authenticated with Vault"
                );
                let token = info.token.clone();
                session.token = Some(info);
                session.last_failure = None;
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(method = self.auth_method.name(), error = %e, "Vault login failed");
                session.last_failure = Some((attempt, e.clone()));
                Err(e)
            }
        }
    }

    /// Drop the cached token; the next call logs in again.
    /// Static tokens are restored rather than cleared.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.token = self.auth_method.preset_token();
        session.last_failure = None;
    }

    pub async fn has_token(&self) -> bool {
        self.session.lock().await.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenAuth;
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingAuth {
        calls: AtomicUsize,
        delay: Duration,
        fail_first: bool,
    }

    impl CountingAuth {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                fail_first: false,
            }
        }
    }

    #[async_trait]
    impl AuthMethod for CountingAuth {
        async fn authenticate(&self, _transport: &HttpTransport) -> Result<TokenInfo, VaultError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail_first && call == 0 {
                return Err(VaultError::Request("connection refused".into()));
            }
            Ok(TokenInfo::new(
                SecretString::from(format!("token-{}", call)),
                Duration::from_secs(3600),
                true,
            ))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(
            reqwest::Client::new(),
            "http://vault:8200".to_string(),
            None,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_token_manager_with_static_token() {
        let auth = Arc::new(StaticTokenAuth::new(SecretString::from("my-token")));
        let manager = TokenManager::new(transport(), auth);

        assert!(manager.has_token().await);
        let token = manager.get_token(None).await.unwrap();
        assert_eq!(token.expose_secret(), "my-token");

        manager.reset().await;
        assert!(manager.has_token().await);
    }

    #[tokio::test]
    async fn test_login_happens_once() {
        let auth = Arc::new(CountingAuth::new(Duration::ZERO));
        let manager = TokenManager::new(transport(), auth.clone());

        assert!(!manager.has_token().await);
        for _ in 0..5 {
            let token = manager.get_token(None).await.unwrap();
            assert_eq!(token.expose_secret(), "token-0");
        }
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_single_login() {
        let auth = Arc::new(CountingAuth::new(Duration::from_millis(50)));
        let manager = Arc::new(TokenManager::new(transport(), auth.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.get_token(None).await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "token-0");
        }
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_cache_empty() {
        let auth = Arc::new(CountingAuth {
            fail_first: true,
            ..CountingAuth::new(Duration::ZERO)
        });
        let manager = TokenManager::new(transport(), auth.clone());

        assert!(manager.get_token(None).await.is_err());
        assert!(!manager.has_token().await);

        let token = manager.get_token(None).await.unwrap();
        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_queued_callers_share_failed_login() {
        let auth = Arc::new(CountingAuth {
            fail_first: true,
            ..CountingAuth::new(Duration::from_millis(50))
        });
        let manager = Arc::new(TokenManager::new(transport(), auth.clone()));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.get_token(None).await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, VaultError::Request(_)), "{:?}", err);
        }
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);

        // a later caller is not handed the stale failure
        let token = manager.get_token(None).await.unwrap();
        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_forces_new_login() {
        let auth = Arc::new(CountingAuth::new(Duration::ZERO));
        let manager = TokenManager::new(transport(), auth.clone());

        manager.get_token(None).await.unwrap();
        manager.reset().await;
        let token = manager.get_token(None).await.unwrap();

        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_login_surfaces_cancelled() {
        let auth = Arc::new(CountingAuth::new(Duration::from_secs(10)));
        let manager = TokenManager::new(transport(), auth);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = manager.get_token(Some(&cancel)).await.unwrap_err();
        assert!(matches!(
            err,
            VaultError::Cancelled {
                operation: Operation::Login
            }
        ));
        assert!(!manager.has_token().await);
    }
}
