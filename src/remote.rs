//! libgit2 integration: credentials, remote callbacks and clone.
//!
//! The negotiator and the progress reporter are plain callbacks here. libgit2
//! owns the retry loop and calls the credential callback again after each
//! rejection. The callback stops answering after the configured number of
//! attempts, and the session's single agent attempt stops it earlier when no
//! credentials were supplied.

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, CredentialType, FetchOptions, Progress, RemoteCallbacks, Repository};

use crate::config::TransferConfig;
use crate::credential::{AllowedTypes, CredentialBackend, CredentialNegotiator, EnvSource};
use crate::errors::AuthError;
use crate::progress::{ProgressReporter, TransferSnapshot};
use crate::session::{AuthRequest, NegotiationSession, strip_userinfo};

/// Backend producing `git2::Cred` objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct Git2Backend;

impl CredentialBackend for Git2Backend {
    type Credential = Cred;

    fn ssh_key_from_agent(&self, username: &str) -> Result<Cred, AuthError> {
        Cred::ssh_key_from_agent(username)
            .map_err(|e| AuthError::AgentUnavailable(e.message().to_string()))
    }

    fn ssh_key(
        &self,
        username: &str,
        public_key: &Path,
        private_key: &Path,
        passphrase: Option<&str>,
    ) -> Result<Cred, AuthError> {
        let public_key = Some(public_key).filter(|p| !p.as_os_str().is_empty());
        Cred::ssh_key(username, public_key, private_key, passphrase)
            .map_err(|e| AuthError::KeyLoadError(e.message().to_string()))
    }

    fn userpass_plaintext(&self, username: &str, password: &str) -> Result<Cred, AuthError> {
        Cred::userpass_plaintext(username, password).map_err(|e| {
            tracing::debug!(error = e.message(), "unable to build plaintext credential");
            AuthError::AllocationFailure
        })
    }
}

impl From<git2::Error> for AuthError {
    fn from(e: git2::Error) -> Self {
        AuthError::TransportError {
            code: e.raw_class() as i32,
            message: e.message().to_string(),
        }
    }
}

impl From<CredentialType> for AllowedTypes {
    fn from(types: CredentialType) -> Self {
        AllowedTypes::from_bits(types.bits())
    }
}

impl From<&Progress<'_>> for TransferSnapshot {
    fn from(stats: &Progress<'_>) -> Self {
        TransferSnapshot::new(
            stats.received_objects() as u64,
            stats.total_objects() as u64,
            stats.received_bytes() as u64,
        )
    }
}

/// Answer one libgit2 credential request, at most `max_attempts` times per session.
///
/// libgit2 re-invokes the callback after every rejection; once the budget is
/// spent the request fails with [`AuthError::UnableToAuthenticate`].
fn answer_credential_request<E: EnvSource>(
    session: &RefCell<NegotiationSession>,
    negotiator: &CredentialNegotiator<Git2Backend, E>,
    attempts: &mut usize,
    max_attempts: usize,
    request: &AuthRequest<'_>,
) -> Result<Cred, AuthError> {
    if *attempts >= max_attempts {
        tracing::warn!(attempts = *attempts, "authentication attempt limit reached");
        return Err(AuthError::UnableToAuthenticate);
    }
    *attempts += 1;
    negotiator.negotiate(&mut session.borrow_mut(), request)
}

/// Callbacks wiring a session into a libgit2 remote operation.
///
/// At most `max_attempts` credentials are produced. Progress lines are only
/// produced when a reporter is given.
pub fn remote_callbacks<'a, E, W>(
    session: &'a RefCell<NegotiationSession>,
    negotiator: &'a CredentialNegotiator<Git2Backend, E>,
    reporter: Option<ProgressReporter<W>>,
    max_attempts: usize,
) -> RemoteCallbacks<'a>
where
    E: EnvSource,
    W: Write + 'a,
{
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |url, username_from_url, allowed_types| {
        let request = AuthRequest::new(url, username_from_url, allowed_types.into());
        answer_credential_request(session, negotiator, &mut attempts, max_attempts, &request)
            .map_err(|e| git2::Error::from_str(&e.to_string()))
    });
    if let Some(mut reporter) = reporter {
        callbacks.transfer_progress(move |stats| {
            let snapshot = TransferSnapshot::from(&stats);
            reporter.report(&mut session.borrow_mut().progress, &snapshot);
            true
        });
    }
    callbacks
}

/// Clone `url` into `local_path`, printing progress to stdout when enabled.
pub fn clone(url: &str, local_path: &Path, config: &TransferConfig) -> Result<Repository, AuthError> {
    let negotiator = CredentialNegotiator::new(Git2Backend);
    clone_with(url, local_path, config, &negotiator, ProgressReporter::stdout())
}

/// Clone with an explicit negotiator and progress sink.
pub fn clone_with<E, W>(
    url: &str,
    local_path: &Path,
    config: &TransferConfig,
    negotiator: &CredentialNegotiator<Git2Backend, E>,
    mut reporter: ProgressReporter<W>,
) -> Result<Repository, AuthError>
where
    E: EnvSource,
    W: Write,
{
    let session = RefCell::new(config.session());
    let reporter = if config.show_progress {
        reporter.announce_clone(local_path);
        Some(reporter)
    } else {
        None
    };

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(remote_callbacks(
        &session,
        negotiator,
        reporter,
        config.max_auth_attempts,
    ));
    let mut checkout = CheckoutBuilder::new();
    checkout.safe();

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch).with_checkout(checkout);
    let repo = builder.clone(url, local_path).map_err(|e| {
        tracing::debug!(url = %strip_userinfo(url), error = %e, "clone failed");
        AuthError::from(e)
    })?;
    tracing::debug!(url = %strip_userinfo(url), path = %local_path.display(), "clone finished");
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::credential::CredentialDescription;
    use crate::errors::ErrorKind;

    #[test]
    fn test_allowed_types_from_git2() {
        let allowed = AllowedTypes::from(CredentialType::SSH_KEY | CredentialType::USERNAME);
        assert!(allowed.contains(AllowedTypes::SSH_KEY));
        assert!(allowed.contains(AllowedTypes::USERNAME));
        assert!(!allowed.contains(AllowedTypes::USERPASS_PLAINTEXT));
        assert_eq!(
            AllowedTypes::from(CredentialType::USER_PASS_PLAINTEXT),
            AllowedTypes::USERPASS_PLAINTEXT
        );
    }

    #[test]
    fn test_git2_error_becomes_transport_error() {
        let err = AuthError::from(git2::Error::from_str("boom"));
        assert!(matches!(err, AuthError::TransportError { ref message, .. } if message == "boom"));
        assert!(err.to_string().ends_with(": boom"));
    }

    #[test]
    fn test_userpass_plaintext() {
        assert!(Git2Backend.userpass_plaintext(" ", "abc123").is_ok());
    }

    #[test]
    fn test_userpass_plaintext_failure_is_allocation_failure() {
        let err = Git2Backend.userpass_plaintext("a\0b", "pw").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    }

    #[test]
    fn test_ssh_key_with_empty_public_key() {
        let cred = Git2Backend
            .ssh_key("git", Path::new(""), Path::new("/home/git/.ssh/id_ed25519"), None)
            .unwrap();
        assert!(cred.has_username());
    }

    #[test]
    fn test_ssh_key_failure_is_key_load_error() {
        let err = Git2Backend
            .ssh_key("git", Path::new("id.pub"), Path::new("id"), Some("pass\0word"))
            .err().unwrap();
        assert_eq!(err.kind(), ErrorKind::KeyLoadError);
    }

    #[test]
    fn test_agent_failure_is_agent_unavailable() {
        let err = Git2Backend.ssh_key_from_agent("git\0user").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AgentUnavailable);
    }

    #[test]
    fn test_git2_negotiator_spends_agent_once() {
        let negotiator = CredentialNegotiator::with_env(Git2Backend, HashMap::new());
        let mut session = NegotiationSession::default();
        let request = AuthRequest::new("ssh://example.com/r.git", None, AllowedTypes::SSH_KEY);
        assert!(negotiator.negotiate(&mut session, &request).is_ok());
        let err = negotiator.negotiate(&mut session, &request).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AgentExhausted);
    }

    #[test]
    fn test_credential_requests_bounded_by_max_attempts() {
        let negotiator = CredentialNegotiator::with_env(Git2Backend, HashMap::new());
        let session = RefCell::new(NegotiationSession::new(CredentialDescription::user_pass(
            "bob", "builder",
        )));
        let request =
            AuthRequest::new("https://example.com/r.git", None, AllowedTypes::USERPASS_PLAINTEXT);
        let mut attempts = 0;
        for _ in 0..2 {
            assert!(answer_credential_request(&session, &negotiator, &mut attempts, 2, &request).is_ok());
        }
        let err = answer_credential_request(&session, &negotiator, &mut attempts, 2, &request)
            .err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnableToAuthenticate);
        assert_eq!(attempts, 2);
    }
}
