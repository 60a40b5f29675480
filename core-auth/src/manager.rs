//! Login and remember-me handling for configured accounts.

use crate::credentials::CredentialStore;
use crate::error::{AuthError, Result};
use crate::remember::RememberToken;
use crate::types::SessionContext;
use chrono::Duration;
use core_runtime::config::AppConfig;
use tracing::{info, warn};

/// Turns credentials or remember-me tokens into a [`SessionContext`].
#[derive(Debug, Clone)]
pub struct AuthManager {
    credentials: CredentialStore,
    secret: String,
    remember_for: Duration,
}

impl AuthManager {
    pub fn new(credentials: CredentialStore, secret: impl Into<String>, remember_days: u32) -> Self {
        Self {
            credentials,
            secret: secret.into(),
            remember_for: Duration::days(i64::from(remember_days)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            CredentialStore::from_users(&config.users),
            config.secret.clone(),
            config.remember_days,
        )
    }

    pub fn remember_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn login(&self, username: &str, password: &str) -> Result<SessionContext> {
        let session = self
            .credentials
            .verify(username, password)
            .ok_or(AuthError::InvalidCredentials)?;
        info!(username = %session.username, "User logged in");
        Ok(session)
    }

    /// Remember-me token for an authenticated session.
    pub fn remember(&self, session: &SessionContext) -> Result<String> {
        RememberToken::issue(session.username.clone()).encode(&self.secret)
    }

    /// Session from a remember-me token. The user must still be configured.
    pub fn resume(&self, token: &str) -> Result<SessionContext> {
        let token = RememberToken::decode(token, &self.secret, self.remember_for).map_err(|e| {
            warn!(error = %e, "Remember-me token rejected");
            e
        })?;

        self.credentials
            .session(&token.username)
            .ok_or(AuthError::UnknownUser(token.username))
    }
}
