use std::collections::HashMap;

use async_trait::async_trait;

use super::{credentials_from_vars, CredentialProvider};
use crate::credentials::DbCredentials;
use crate::error::Result;

/// Credentials injected as process variables
pub struct EnvProvider {
    environ: HashMap<String, String>,
}

impl EnvProvider {
    pub fn new(environ: HashMap<String, String>) -> Self {
        Self { environ }
    }
}

#[async_trait]
impl CredentialProvider for EnvProvider {
    async fn load(&self) -> Result<DbCredentials> {
        credentials_from_vars(&self.environ)
    }

    fn name(&self) -> &'static str {
        "env"
    }
}
