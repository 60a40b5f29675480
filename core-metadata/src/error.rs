use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Rate limited by {provider}, retry after {retry_after_seconds}s")]
    RateLimited {
        provider: String,
        retry_after_seconds: u64,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(String),

    #[error("Remote API error: {0}")]
    RemoteApi(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

}

impl MetadataError {
    /// Failures worth retrying later rather than reporting to the user.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MetadataError::NetworkError(_)
                | MetadataError::RateLimited { .. }
                | MetadataError::HttpError { status: 500..=599, .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
