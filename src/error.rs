//! Session error types

use thiserror::Error;

/// Result alias used throughout the crate
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur during session operations
///
/// A missing record is never an error: stores report it as `Ok(None)`.
/// Expired records are handled inside the engine and never surface here.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Error from the session store backend
    #[error("session store error: {0}")]
    Store(String),

    /// Error during serialization/deserialization of a record or value
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cookie-carried payload could not be decoded
    #[error("invalid session payload: {0}")]
    InvalidPayload(String),

    /// A cookie-carried payload failed signature verification
    #[error("invalid session payload signature")]
    InvalidSignature,

    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl SessionError {
    /// Create a generic store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}
