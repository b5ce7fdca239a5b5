use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_DB_PORT: u16 = 1521;
const MASK: &str = "********";

/// Resolved database connection credentials
#[derive(Clone)]
pub struct DbCredentials {
    pub host: String,
    pub port: u16,
    pub sid: String,
    pub user: String,
    pub password: SecretString,
}

impl DbCredentials {
    /// Easy-connect string, `host:port/sid`
    pub fn connect_string(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.sid)
    }

    /// Serializable view; the password is masked unless `reveal` is set
    pub fn view(&self, reveal: bool) -> CredentialsView<'_> {
        CredentialsView {
            host: &self.host,
            port: self.port,
            sid: &self.sid,
            user: &self.user,
            password: if reveal {
                self.password.expose_secret()
            } else {
                MASK
            },
        }
    }
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct CredentialsView<'a> {
    pub host: &'a str,
    pub port: u16,
    pub sid: &'a str,
    pub user: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> DbCredentials {
        DbCredentials {
            host: "db.qa.local".to_string(),
            port: 1521,
            sid: "ORCL".to_string(),
            user: "qa_user".to_string(),
            password: SecretString::from("hunter2"),
        }
    }

    #[test]
    fn test_connect_string() {
        assert_eq!(credentials().connect_string(), "db.qa.local:1521/ORCL");
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("qa_user"));
    }

    #[test]
    fn test_view_masks_unless_revealed() {
        let creds = credentials();
        let masked = serde_json::to_value(creds.view(false)).unwrap();
        assert_eq!(masked["password"], MASK);
        assert_eq!(masked["user"], "qa_user");

        let revealed = serde_json::to_value(creds.view(true)).unwrap();
        assert_eq!(revealed["password"], "hunter2");
    }
}
