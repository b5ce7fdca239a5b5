use std::fmt;
use std::str::FromStr;

use crate::error::CredentialsError;
use crate::settings::{lookup, Settings};

/// Where database credentials come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Local dotenv file, process variables override it
    EnvFile,
    /// Variables already injected into the process (CI)
    Process,
    /// HashiCorp Vault KV secret
    Vault,
}

impl FromStr for Source {
    type Err = CredentialsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env-file" | "envfile" | "dotenv" | "file" => Ok(Self::EnvFile),
            "env" | "process" => Ok(Self::Process),
            "vault" => Ok(Self::Vault),
            other => Err(CredentialsError::Configuration(format!(
                "unknown credentials source: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvFile => f.write_str("env-file"),
            Self::Process => f.write_str("env"),
            Self::Vault => f.write_str("vault"),
        }
    }
}

/// Explicit override first, then Vault when it is fully configured,
/// then injected variables, then the local env file.
pub fn select_source(settings: &Settings) -> Source {
    if let Some(source) = settings.source {
        return source;
    }
    if settings.vault.has_credentials() && settings.vault.secret_path.is_some() {
        return Source::Vault;
    }
    if lookup(&settings.environ, &["DB_USER"]).is_some() {
        return Source::Process;
    }
    Source::EnvFile
}
