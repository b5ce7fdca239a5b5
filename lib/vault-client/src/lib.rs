//! vault-client - HashiCorp Vault KV reader
//!
//! Authenticates with AppRole (login on first use, cached afterwards) or a
//! static token, then reads KV v1/v2 secrets into flat string documents.
//! Configuration is always passed in explicitly; nothing is read from the
//! process environment.

pub mod auth;
mod client;
mod config;
mod error;
mod models;
mod transport;

pub use client::{VaultClient, VaultClientBuilder};
pub use config::{AuthConfig, Credentials, DEFAULT_APPROLE_MOUNT, DEFAULT_TIMEOUT};
pub use error::{AuthError, Operation, VaultError};
pub use models::{KvEngine, SecretDocument, SecretPath, unwrap_envelope};
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpTransport, RawResponse};
