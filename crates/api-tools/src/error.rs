//! Error types for `klaud-api-tools`.

use thiserror::Error;

/// Maximum number of characters of an upstream error body carried in [`DispatchError::Upstream`].
pub const UPSTREAM_EXCERPT_CHARS: usize = 200;

/// Failure of a single operation invocation.
///
/// Every variant is converted into the error envelope at the invocation boundary; none of them
/// is allowed to escape as a process-level fault.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The caller named an operation that is not in the registry.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Schema violation detected locally. Nothing was sent upstream.
    #[error("Invalid argument '{parameter}': {reason}")]
    InvalidArgument { parameter: String, reason: String },

    /// The upstream answered with a non-2xx status.
    #[error("API {status}: {excerpt}")]
    Upstream { status: u16, excerpt: String },

    /// The upstream could not be reached (DNS, connect, timeout, broken body stream).
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// Anything else: request construction or response parsing went wrong.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub(crate) fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`DispatchError::Upstream`] from a status code and a raw response body.
    #[must_use]
    pub fn upstream(status: u16, body: &[u8]) -> Self {
        Self::Upstream {
            status,
            excerpt: excerpt(body),
        }
    }

    /// Stable, machine-readable name of the error kind (used as a log field).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "unknown_operation",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

fn excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(UPSTREAM_EXCERPT_CHARS)
        .collect()
}
