//! Shared error type across docgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Capability or condition check failed.
    PolicyDenied,
    /// Missing argument or malformed operation identifier.
    Validation,
    /// Remote API answered with a non-success status.
    RemoteError,
    /// Transport failure (timeout, refused connection, unreadable body).
    RequestFailed,
    /// Configuration could not be read.
    Config,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::PolicyDenied => "POLICY_DENIED",
            ClientCode::Validation => "VALIDATION",
            ClientCode::RemoteError => "REMOTE_ERROR",
            ClientCode::RequestFailed => "REQUEST_FAILED",
            ClientCode::Config => "CONFIG",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DocGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum DocGateError {
    #[error("{0}")]
    PolicyDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("HTTP {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl DocGateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            DocGateError::PolicyDenied(_) => ClientCode::PolicyDenied,
            DocGateError::Validation(_) => ClientCode::Validation,
            DocGateError::Remote { .. } => ClientCode::RemoteError,
            DocGateError::RequestFailed(_) => ClientCode::RequestFailed,
            DocGateError::Config(_) => ClientCode::Config,
            DocGateError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            DocGateError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True for failures resolved locally, before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DocGateError::PolicyDenied(_) | DocGateError::Validation(_)
        )
    }
}
