//! Error types shared by every sink variant.

use thiserror::Error;

/// Result type alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors surfaced by sink lifecycle operations.
///
/// `Config`, `Load` and `Contract` are fatal to `init`; the remaining kinds
/// are scoped to a single call. No variant is retried internally, retry
/// policy belongs to the caller.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Mandatory configuration missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// Guest bytecode unreadable or not a compiled module
    #[error("load error: {0}")]
    Load(String),

    /// The guest module does not satisfy the export contract
    #[error("contract error: {0}")]
    Contract(String),

    /// The backing resource rejected this record; for the wasm sink this is
    /// the guest's own error text, surfaced verbatim
    #[error("{0}")]
    Invocation(String),

    /// The guest crashed or exceeded a sandbox limit mid-invocation
    #[error("guest trap: {0}")]
    Trap(String),

    /// The guest broke the status/buffer convention
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Lifecycle misuse, e.g. produce before init or after close
    #[error("invalid sink state: {0}")]
    InvalidState(String),
}

impl SinkError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a contract error
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Create an invocation error
    pub fn invocation(msg: impl Into<String>) -> Self {
        Self::Invocation(msg.into())
    }

    /// Create a trap error
    pub fn trap(msg: impl Into<String>) -> Self {
        Self::Trap(msg.into())
    }

    /// Create a protocol violation error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Check if this error aborts initialization
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Load(_) | Self::Contract(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SinkError::config("module_path is required");
        assert_eq!(
            err.to_string(),
            "configuration error: module_path is required"
        );

        // Guest-reported text passes through unchanged.
        let err = SinkError::invocation("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_fatal_check() {
        assert!(SinkError::config("x").is_fatal());
        assert!(SinkError::load("x").is_fatal());
        assert!(SinkError::contract("x").is_fatal());
        assert!(!SinkError::invocation("x").is_fatal());
        assert!(!SinkError::trap("x").is_fatal());
        assert!(!SinkError::protocol("x").is_fatal());
        assert!(!SinkError::invalid_state("x").is_fatal());
    }
}
