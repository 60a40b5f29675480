//! Configured accounts and password verification.

use crate::types::SessionContext;
use core_runtime::config::UserConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Lowercase hex SHA-256 of a password, the form stored in config.
///
/// # Examples
///
/// ```
/// use core_auth::hash_password;
///
/// assert_eq!(
///     hash_password("password"),
///     "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
/// );
/// ```
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare without returning early on the first differing byte.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone)]
struct Account {
    password_sha256: String,
    email: Option<String>,
}

/// Accounts allowed to sign in.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    accounts: HashMap<String, Account>,
}

impl CredentialStore {
    pub fn from_users(users: &[UserConfig]) -> Self {
        let accounts = users
            .iter()
            .map(|user| {
                (
                    user.username.trim().to_string(),
                    Account {
                        password_sha256: user.password_sha256.trim().to_lowercase(),
                        email: user.email.clone(),
                    },
                )
            })
            .collect();
        Self { accounts }
    }

    /// Session for `username` when `password` hashes to the stored digest.
    pub fn verify(&self, username: &str, password: &str) -> Option<SessionContext> {
        let username = username.trim();
        let Some(account) = self.accounts.get(username) else {
            debug!(username, "Login for unknown user");
            return None;
        };

        let digest = hash_password(password);
        if !constant_time_eq(digest.as_bytes(), account.password_sha256.as_bytes()) {
            warn!(username, "Login rejected: wrong password");
            return None;
        }

        Some(self.session_for(username, account))
    }

    /// Session for a known user without a password check.
    pub fn session(&self, username: &str) -> Option<SessionContext> {
        let username = username.trim();
        self.accounts
            .get(username)
            .map(|account| self.session_for(username, account))
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username.trim())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn session_for(&self, username: &str, account: &Account) -> SessionContext {
        SessionContext {
            username: username.to_string(),
            email: account.email.clone(),
        }
    }
}
