//! Bearer token from the environment.
//!
//! Token acquisition and refresh happen outside orgbook (for example
//! `az account get-access-token`); this authenticator only picks the result
//! up from a variable.

use async_trait::async_trait;
use orgbook_core::{AccessToken, Account, Authenticator, DirectoryError};

#[derive(Debug, Clone)]
pub struct EnvAuthenticator {
    var: String,
}

impl EnvAuthenticator {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    fn read(&self) -> Result<String, DirectoryError> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DirectoryError::AuthRequired(format!("set ${} to a Graph access token", self.var)))
    }
}

#[async_trait]
impl Authenticator for EnvAuthenticator {
    async fn acquire_token(&self) -> Result<AccessToken, DirectoryError> {
        self.read().map(AccessToken)
    }

    /// Re-reads the variable; succeeds once it is set.
    async fn login(&self) -> Result<Account, DirectoryError> {
        self.read()?;
        let username = std::env::var("USER").unwrap_or_else(|_| format!("${}", self.var));
        tracing::info!(%username, "signed in from environment token");
        Ok(Account { username })
    }
}
