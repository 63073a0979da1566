//! Authentication driver.
//!
//! The retry loop is owned here, on the transport side: the remote issues a
//! challenge (the allowed types), the negotiator answers with one credential,
//! the remote accepts or rejects it. The negotiator itself only guarantees
//! deterministic per-call behaviour and the single SSH agent attempt.

use crate::credential::{AllowedTypes, CredentialBackend, CredentialNegotiator, EnvSource};
use crate::errors::AuthError;
use crate::session::{AuthRequest, NegotiationSession};

/// Outcome of offering a credential to the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Remote side of an authentication exchange.
pub trait Transport {
    type Credential;

    fn url(&self) -> &str;

    /// Username embedded in the remote URL (`user@host`), if any.
    fn username_from_url(&self) -> Option<&str>;

    /// Schemes the remote accepts for the next attempt, or `None` once it has
    /// nothing left to offer.
    fn challenge(&mut self) -> Option<AllowedTypes>;

    /// Present a credential. Transport failures come back as
    /// [`AuthError::TransportError`].
    fn offer(&mut self, credential: Self::Credential) -> Result<Verdict, AuthError>;
}

/// Run challenges until a credential is accepted.
///
/// A negotiation failure only ends the current attempt: the remote is
/// challenged again and may offer a scheme the session can answer. Every
/// round counts toward `max_attempts`, offered or not. Running out of
/// challenges or attempts yields [`AuthError::UnableToAuthenticate`].
/// Transport errors are returned unchanged.
pub fn authenticate<T, B, E>(
    transport: &mut T,
    negotiator: &CredentialNegotiator<B, E>,
    session: &mut NegotiationSession,
    max_attempts: usize,
) -> Result<(), AuthError>
where
    T: Transport,
    B: CredentialBackend<Credential = T::Credential>,
    E: EnvSource,
{
    let mut attempts = 0;
    let mut last_error = None;
    while attempts < max_attempts {
        let Some(allowed_types) = transport.challenge() else {
            tracing::debug!(attempts, "remote has no further authentication schemes");
            break;
        };
        attempts += 1;

        let negotiated = {
            let request = AuthRequest::new(
                transport.url(),
                transport.username_from_url(),
                allowed_types,
            );
            negotiator.negotiate(session, &request)
        };
        let credential = match negotiated {
            Ok(credential) => credential,
            Err(e) => {
                tracing::debug!(attempts, error = %e, "no credential for this challenge");
                last_error = Some(e);
                continue;
            }
        };

        match transport.offer(credential)? {
            Verdict::Accepted => {
                tracing::debug!(attempts, "authenticated");
                return Ok(());
            }
            Verdict::Rejected => {
                tracing::debug!(attempts, "credential rejected by remote");
            }
        }
    }
    match last_error {
        Some(e) => tracing::warn!(attempts, error = %e, "authentication failed"),
        None => tracing::warn!(attempts, "authentication failed"),
    }
    Err(AuthError::UnableToAuthenticate)
}
