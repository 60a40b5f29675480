use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The client could not be constructed (TLS backend, bad settings)
    #[error("HTTP client unavailable: {0}")]
    NotAvailable(String),

    #[error("Request failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Could not connect: {0}")]
    Connection(String),
}

impl BridgeError {
    /// No response was received from the remote host.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kinds() {
        assert!(BridgeError::Timeout("30s".into()).is_transport());
        assert!(BridgeError::Connection("refused".into()).is_transport());
        assert!(!BridgeError::OperationFailed("bad body".into()).is_transport());
    }
}
