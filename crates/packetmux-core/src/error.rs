//! Shared error type across packetmux crates.

use thiserror::Error;

/// Stable error codes (useful for logs and assertions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed envelope or payload.
    Codec,
    /// A second handler was registered for the same type tag.
    DuplicateHandler,
    /// The transport refused a publish or subscribe.
    Transport,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Codec => "CODEC",
            ErrorCode::DuplicateHandler => "DUPLICATE_HANDLER",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MuxError>;

/// Unified error type used by core and router.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("codec: {0}")]
    Codec(String),
    #[error("duplicate handler: {0}")]
    DuplicateHandler(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MuxError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MuxError::Codec(_) => ErrorCode::Codec,
            MuxError::DuplicateHandler(_) => ErrorCode::DuplicateHandler,
            MuxError::Transport(_) => ErrorCode::Transport,
            MuxError::BadConfig(_) => ErrorCode::BadConfig,
            MuxError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MuxError::Internal(_) => ErrorCode::Internal,
        }
    }
}
