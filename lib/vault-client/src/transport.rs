use crate::error::{Operation, VaultError};
use reqwest::{Method, RequestBuilder, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
pub(crate) const TOKEN_HEADER: &str = "X-Vault-Token";

/// Status and body text of a completed exchange
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Shared HTTP plumbing: URL building, namespace header and the per-call deadline
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    address: String,
    namespace: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(
        http: reqwest::Client,
        address: String,
        namespace: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            address,
            namespace,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.namespace {
            Some(namespace) => request.header(NAMESPACE_HEADER, namespace),
            None => request,
        }
    }

    /// Sends the request and reads the body, bounded by the configured timeout.
    /// Hitting the deadline drops the in-flight exchange.
    pub async fn send(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<RawResponse, VaultError> {
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| VaultError::Request(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| VaultError::Request(e.to_string()))?;
            Ok(RawResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(%operation, timeout = ?self.timeout, "Vault request timed out");
                Err(VaultError::Timeout {
                    operation,
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// Races `fut` against caller cancellation. Cancellation wins ties.
pub(crate) async fn cancellable<T, F>(
    operation: Operation,
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<T, VaultError>
where
    F: Future<Output = Result<T, VaultError>>,
{
    let Some(cancel) = cancel else {
        return fut.await;
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(%operation, "Vault request cancelled by caller");
            Err(VaultError::Cancelled { operation })
        }
        result = fut => result,
    }
}
