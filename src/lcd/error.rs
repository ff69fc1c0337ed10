//! Error definitions for LCD operations.

use thiserror::Error;

/// Errors that can occur while talking to an LCD backend.
#[derive(Debug, Error)]
pub enum LcdError {
    /// The account has no on-chain state yet.
    #[error("Account {0} does not exist on chain: it has not transacted on-chain yet. Send some tokens there before trying to query sequence.")]
    AccountNotFound(String),

    /// No contract instance lives at the address.
    #[error("No contract found at address \"{0}\"")]
    ContractNotFound(String),

    /// The backend has no code history for the address.
    #[error("No contract history found for address \"{0}\"")]
    ContractHistoryNotFound(String),

    /// Backend response violated an expected invariant.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend response could not be decoded into the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A search matched more results than a single page can hold.
    #[error("Found more results on the backend than we can process currently. Results: {total}, supported: {limit}")]
    UnsupportedPagination { total: u64, limit: u32 },

    /// Error declared by the backend itself.
    #[error("{message} (HTTP {status})")]
    Backend { status: u16, message: String },

    /// Transport level failure, timeouts included.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured API URL cannot be used.
    #[error("Invalid API URL '{0}'")]
    InvalidUrl(String),
}

impl LcdError {
    /// True for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LcdError::AccountNotFound(_)
                | LcdError::ContractNotFound(_)
                | LcdError::ContractHistoryNotFound(_)
        )
    }

    /// The backend-declared message, if this error came from the backend.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            LcdError::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LcdError {
    fn from(e: serde_json::Error) -> Self {
        LcdError::MalformedResponse(e.to_string())
    }
}

/// Result type for LCD operations.
pub type LcdResult<T> = Result<T, LcdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LcdError::AccountNotFound("wasm1abc".to_string());
        assert!(err.to_string().contains("wasm1abc"));
        assert!(err.to_string().contains("has not transacted on-chain yet"));

        let err = LcdError::UnsupportedPagination { total: 250, limit: 100 };
        assert!(err.to_string().contains("250"));
        assert!(err.to_string().contains("100"));

        let err = LcdError::Backend {
            status: 500,
            message: "not found: contract".to_string(),
        };
        assert_eq!(err.to_string(), "not found: contract (HTTP 500)");
    }

    #[test]
    fn test_not_found_family() {
        assert!(LcdError::ContractNotFound("a".into()).is_not_found());
        assert!(LcdError::ContractHistoryNotFound("a".into()).is_not_found());
        assert!(!LcdError::Protocol("x".into()).is_not_found());
    }

    #[test]
    fn test_backend_message() {
        let err = LcdError::Backend {
            status: 400,
            message: "bad request".to_string(),
        };
        assert_eq!(err.backend_message(), Some("bad request"));
        assert_eq!(LcdError::Protocol("x".into()).backend_message(), None);
    }
}
