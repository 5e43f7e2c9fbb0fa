//! Transient login credentials.
//!
//! The engine holds credentials only for the duration of a login call and
//! never persists them; the password stays wrapped until the moment it is
//! typed into the portal.

use anyhow::{Context, Result};
use secrecy::SecretString;

pub const USER_ENV_VAR: &str = "BANKFETCH_USER";
pub const PASS_ENV_VAR: &str = "BANKFETCH_PASS";

pub struct Credentials {
    pub user: String,
    pub pass: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: SecretString::from(pass.into()),
        }
    }

    /// Resolve credentials from the environment (CLI entry point).
    pub fn from_env() -> Result<Self> {
        let user = std::env::var(USER_ENV_VAR)
            .with_context(|| format!("{USER_ENV_VAR} is not set"))?;
        let pass = std::env::var(PASS_ENV_VAR)
            .with_context(|| format!("{PASS_ENV_VAR} is not set"))?;
        Ok(Self::new(user, pass))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}
