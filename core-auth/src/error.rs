use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Remember-me tokens are disabled (no secret configured)")]
    RememberDisabled,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    TokenExpired,
}

pub type Result<T> = std::result::Result<T, AuthError>;
