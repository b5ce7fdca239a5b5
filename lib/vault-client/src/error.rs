use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Network operation a deadline or cancellation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Read => f.write_str("read"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Vault AppRole login failed ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Vault login returned no token")]
    NoToken,
}

#[derive(Debug, Clone, Error)]
pub enum VaultError {
    #[error("Invalid Vault configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("Vault read failed for {path} ({status}): {body}")]
    SecretRead {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Field {key} not found in secret {path}")]
    FieldNotFound { path: String, key: String },

    #[error("Vault {operation} timed out after {timeout:?}")]
    Timeout {
        operation: Operation,
        timeout: Duration,
    },

    #[error("Vault {operation} cancelled")]
    Cancelled { operation: Operation },

    #[error("Vault request error: {0}")]
    Request(String),

    #[error("Invalid Vault response: {0}")]
    InvalidResponse(String),
}

impl VaultError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_login_message() {
        let err = VaultError::from(AuthError::Rejected {
            status: 400,
            body: r#"{"errors":["invalid role or secret ID"]}"#.to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("invalid role or secret ID"));
    }

    #[test]
    fn test_timeout_names_operation_and_duration() {
        let err = VaultError::Timeout {
            operation: Operation::Login,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Vault login timed out after 250ms");
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
    }
}
