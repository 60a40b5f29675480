use serde::{Deserialize, Serialize};
use std::fmt;

/// The signed-in user a request acts on behalf of.
///
/// Passed explicitly to every operation that needs a logged-in user, so
/// there is no process-wide "current user".
///
/// # Examples
///
/// ```
/// use core_auth::SessionContext;
///
/// let session = SessionContext::new("ihsahn").with_email("ihsahn@example.com");
/// assert_eq!(session.username, "ihsahn");
/// assert!(session.is_owner("ihsahn"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub email: Option<String>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether this user owns a record posted by `owner`.
    pub fn is_owner(&self, owner: &str) -> bool {
        self.username == owner
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}
