//! Credential negotiation for outbound transport sessions: credential
//! descriptions, the allowed-types bitmask, environment resolution, secret
//! buffers and the backends that build the transport's credential objects.

pub mod backend;
pub mod env;
pub mod negotiator;
pub mod secret;
pub mod types;

pub use backend::{CredentialBackend, PlainBackend};
pub use env::{EnvSource, EnvironmentResolver, ProcessEnv};
pub use negotiator::CredentialNegotiator;
pub use secret::Secret;
pub use types::{AllowedTypes, Credential, CredentialDescription, CredentialKind};
