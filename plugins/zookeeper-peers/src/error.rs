//! Error types for peer-relation operations.
//!
//! Absence is not an error here: missing scopes, keys, and nonces resolve to
//! `None` or an empty list. These variants cover genuine failures from the
//! host-backed stores and configuration problems caught while building the
//! key contract.

use thiserror::Error;

/// Top-level error type for the zookeeper-peers crate.
#[derive(Debug, Error)]
pub enum PeersError {
    /// Relation or leadership store failure surfaced through the host seam.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error (empty fields, unresolved placeholders).
    #[error("configuration error: {0}")]
    Config(String),
}

impl PeersError {
    /// Wrap a store-side failure, keeping only its message.
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        PeersError::Store(err.to_string())
    }

    /// Returns true if this error came from a backing store.
    pub fn is_store(&self) -> bool {
        matches!(self, PeersError::Store(_))
    }
}

/// Shorthand result alias for relation operations.
pub type PeersResult<T> = Result<T, PeersError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PeersError::store("connection reset");
        assert!(err.is_store());
        assert_eq!(format!("{err}"), "store error: connection reset");

        let err = PeersError::Config("'relation_name' is empty".into());
        assert!(!err.is_store());
        let msg = format!("{err}");
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("relation_name"));
    }
}
