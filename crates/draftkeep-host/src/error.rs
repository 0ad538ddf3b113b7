//! Error types for draftkeep-host

use thiserror::Error;

/// Result type alias using draftkeep-host Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the host document or the persistence medium
#[derive(Error, Debug)]
pub enum Error {
    /// The execution context backing the medium was torn down mid-call
    #[error("Extension context invalidated")]
    ContextInvalidated,

    /// The medium rejected or failed an operation
    #[error("Storage medium error: {0}")]
    Medium(String),

    /// A structural query against the document failed
    #[error("Query failed for '{selector}': {message}")]
    Query { selector: String, message: String },

    /// Filesystem error from a file-backed medium
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a query error for a selector
    pub fn query(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Whether the failure means the surrounding context is gone.
    ///
    /// Callers abort silently on this; there is nothing left to retry in.
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, Error::ContextInvalidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_invalidated_detection() {
        assert!(Error::ContextInvalidated.is_context_invalidated());
        assert!(!Error::Medium("quota".into()).is_context_invalidated());
        assert!(!Error::query("div", "bad").is_context_invalidated());
    }

    #[test]
    fn test_query_error_message() {
        let err = Error::query("main h2", "selector syntax");
        assert_eq!(
            err.to_string(),
            "Query failed for 'main h2': selector syntax"
        );
    }
}
