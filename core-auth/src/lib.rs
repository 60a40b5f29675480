//! # Authentication
//!
//! Sign-in for the accounts listed in the wall's configuration.
//!
//! - [`CredentialStore`] checks a password against the configured SHA-256
//!   digest and yields a [`SessionContext`]
//! - [`RememberToken`] is a signed, stateless "remember me" token
//! - [`AuthManager`] ties both to an [`AppConfig`](core_runtime::config::AppConfig)
//!
//! Every operation that needs a logged-in user takes a `&SessionContext`.

pub mod credentials;
pub mod error;
pub mod manager;
pub mod remember;
pub mod types;

pub use credentials::{hash_password, CredentialStore};
pub use error::{AuthError, Result};
pub use manager::AuthManager;
pub use remember::RememberToken;
pub use types::SessionContext;
