use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`HawserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Missing or invalid credentials or endpoints.
    Config,
    /// Network or authentication failure reported by the backend.
    Transport,
    /// The backend sent something this version does not understand.
    Protocol,
    /// Division or remainder by zero, or a domain violation.
    Arithmetic,
    /// A result does not fit the decimal representation.
    Overflow,
    /// An operation failed in an unexpected way (for example it panicked).
    Internal,
}

/// Unified error type for the hawser workspace.
///
/// Every recoverable failure is one of these. Contract violations on handles (double release,
/// use after release) are not represented here: they panic, because continuing would mean
/// touching a torn-down session.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HawserError {
    /// A required credential was not provided.
    #[error("missing credential: {var}")]
    MissingCredential {
        /// Name of the missing variable or field, e.g. `HAWSER_APP_KEY`.
        var: String,
    },

    /// A configuration value is present but unusable (bad URL, bad language).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The backend rejected a request or the network failed.
    #[error("transport error {code}: {message}")]
    Transport {
        /// Backend-provided error code.
        code: i64,
        /// Backend-provided message.
        message: String,
    },

    /// The session was closed before the operation could complete.
    #[error("session closed")]
    SessionClosed,

    /// A boundary tag outside the known range of an enumeration.
    #[error("unknown {name} variant: {tag}")]
    UnknownVariant {
        /// Enumeration name, e.g. `OrderStatus`.
        name: String,
        /// The offending tag.
        tag: i64,
    },

    /// A boundary record that is structurally valid but semantically impossible.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Text that does not parse as the expected value.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Division or remainder by zero, or a function evaluated outside its domain.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// A result exceeds the representable range.
    #[error("overflow: {0}")]
    Overflow(String),

    /// An operation failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HawserError {
    /// Helper: build a `MissingCredential` error.
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    /// Helper: build an `InvalidConfig` error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Helper: build a `Transport` error.
    pub fn transport(code: i64, message: impl Into<String>) -> Self {
        Self::Transport {
            code,
            message: message.into(),
        }
    }

    /// Helper: build an `UnknownVariant` error for enumeration `name`.
    pub fn unknown_variant(name: impl Into<String>, tag: i64) -> Self {
        Self::UnknownVariant {
            name: name.into(),
            tag,
        }
    }

    /// Helper: build an `InvalidRecord` error.
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Helper: build an `InvalidFormat` error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Helper: build an `Arithmetic` error.
    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::Arithmetic(msg.into())
    }

    /// Helper: build an `Overflow` error.
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    /// Helper: build an `Internal` error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } | Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Transport { .. } | Self::SessionClosed => ErrorKind::Transport,
            Self::UnknownVariant { .. } | Self::InvalidRecord(_) | Self::InvalidFormat(_) => {
                ErrorKind::Protocol
            }
            Self::Arithmetic(_) => ErrorKind::Arithmetic,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable numeric code.
    ///
    /// Transport errors keep the backend's code; every other variant has a fixed code so that
    /// callers on the far side of the boundary can switch on it.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Transport { code, .. } => *code,
            Self::MissingCredential { .. } => 1001,
            Self::InvalidConfig(_) => 1002,
            Self::SessionClosed => 2001,
            Self::UnknownVariant { .. } => 3001,
            Self::InvalidRecord(_) => 3002,
            Self::InvalidFormat(_) => 3003,
            Self::Arithmetic(_) => 4001,
            Self::Overflow(_) => 4002,
            Self::Internal(_) => 9001,
        }
    }

    /// Human-readable message.
    ///
    /// For transport errors this is the backend's message verbatim; otherwise the `Display`
    /// rendering.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if retrying the same call could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
