//! Error types for the Git-Transfer-Auth crate.
//!
//! This module defines the closed error enumeration used by credential
//! negotiation, environment resolution and the transport driver. It integrates
//! with `thiserror` so that every variant carries its user-facing message in
//! its `#[error]` attribute; there is no separate message table.
//!
//! Notes:
//! - Only `TransportError` and `UnableToAuthenticate` are meant to reach the
//!   end user. The rest are consumed by the transport's retry/abort logic.
//! - No variant ever carries secret material, only variable names and kinds.

use thiserror::Error;

use crate::credential::CredentialKind;

#[derive(Error, Debug)]
/// Unified error enumeration for the Git-Transfer-Auth library.
///
/// - Returned by every negotiation attempt that does not produce a credential.
/// - Implements `std::error::Error` via `thiserror`.
pub enum AuthError {
    /// The supplied credential variant is not among the allowed types.
    #[error("The `{0}` credentials are not among the allowed credential types.")]
    Unsupported(CredentialKind),

    /// Required environment variable missing or empty.
    #[error("Environment variable `{0}` is not set or is empty.")]
    EnvVarUnset(String),

    /// Secret buffer allocation failed.
    #[error("Unable to allocate memory buffer")]
    AllocationFailure,

    /// SSH key material unreadable or invalid.
    #[error("Unable to load SSH key: {0}")]
    KeyLoadError(String),

    /// The SSH agent could not provide a credential.
    #[error("SSH agent unavailable: {0}")]
    AgentUnavailable(String),

    /// The SSH agent was already tried once in this session.
    #[error("SSH agent authentication was already attempted for this session.")]
    AgentExhausted,

    /// Failure reported by the underlying transport, carried verbatim.
    #[error("Error {code}: {message}")]
    TransportError { code: i32, message: String },

    /// Every allowed scheme was exhausted without being accepted.
    #[error("Unable to authenticate with supplied credentials")]
    UnableToAuthenticate,
}

/// Fieldless mirror of [`AuthError`] for matching without caring about payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unsupported,
    EnvVarUnset,
    AllocationFailure,
    KeyLoadError,
    AgentUnavailable,
    AgentExhausted,
    TransportError,
    UnableToAuthenticate,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unsupported(_) => ErrorKind::Unsupported,
            AuthError::EnvVarUnset(_) => ErrorKind::EnvVarUnset,
            AuthError::AllocationFailure => ErrorKind::AllocationFailure,
            AuthError::KeyLoadError(_) => ErrorKind::KeyLoadError,
            AuthError::AgentUnavailable(_) => ErrorKind::AgentUnavailable,
            AuthError::AgentExhausted => ErrorKind::AgentExhausted,
            AuthError::TransportError { .. } => ErrorKind::TransportError,
            AuthError::UnableToAuthenticate => ErrorKind::UnableToAuthenticate,
        }
    }

    pub fn transport(code: i32, message: &str) -> Self {
        AuthError::TransportError {
            code,
            message: message.to_string(),
        }
    }

    /// Whether the error is surfaced to the end user with diagnostic detail.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AuthError::TransportError { .. } | AuthError::UnableToAuthenticate
        )
    }
}
