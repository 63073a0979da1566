//! Credential negotiation.
//!
//! The transport calls [`CredentialNegotiator::negotiate`] once per
//! authentication attempt with a freshly computed set of allowed types. Each
//! call is a single attempt: the negotiator never retries, and a description
//! of `None` gets exactly one SSH agent attempt per session.

use super::backend::CredentialBackend;
use super::env::{EnvSource, EnvironmentResolver, ProcessEnv};
use super::types::{AllowedTypes, CredentialDescription};
use crate::errors::AuthError;
use crate::session::{AuthRequest, NegotiationSession, strip_userinfo};

/// Username sent for bearer tokens encoded as user/password credentials.
pub const TOKEN_USERNAME: &str = " ";

/// SSH username used when the remote URL does not carry one.
pub const DEFAULT_SSH_USERNAME: &str = "git";

/// Matches a session's credential description against the allowed types.
pub struct CredentialNegotiator<B, E = ProcessEnv> {
    backend: B,
    resolver: EnvironmentResolver<E>,
}

impl<B: CredentialBackend> CredentialNegotiator<B, ProcessEnv> {
    /// Negotiator reading environment credentials from the process environment.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            resolver: EnvironmentResolver::new(),
        }
    }
}

impl<B: CredentialBackend, E: EnvSource> CredentialNegotiator<B, E> {
    pub fn with_env(backend: B, env: E) -> Self {
        Self {
            backend,
            resolver: EnvironmentResolver::with_source(env),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Produce a credential for one authentication attempt.
    pub fn negotiate(
        &self,
        session: &mut NegotiationSession,
        request: &AuthRequest<'_>,
    ) -> Result<B::Credential, AuthError> {
        let allowed = request.allowed_types;
        let kind = session.description().kind();
        tracing::debug!(
            url = %strip_userinfo(request.url),
            credentials = %kind,
            allowed = %allowed,
            "credential negotiation attempt"
        );

        if !allowed.contains(kind.required_type()) {
            tracing::debug!(credentials = %kind, allowed = %allowed, "credential type not allowed");
            return Err(AuthError::Unsupported(kind));
        }

        let ssh_username = request.username_from_url.unwrap_or(DEFAULT_SSH_USERNAME);

        match session.description() {
            CredentialDescription::None => {
                if !session.claim_agent_attempt() {
                    tracing::debug!("ssh agent already attempted in this session");
                    return Err(AuthError::AgentExhausted);
                }
                self.backend
                    .ssh_key_from_agent(ssh_username)
                    .map_err(|e| match e {
                        AuthError::AgentUnavailable(reason) => AuthError::AgentUnavailable(reason),
                        other => AuthError::AgentUnavailable(other.to_string()),
                    })
            }
            CredentialDescription::SshKey {
                public_key,
                private_key,
                passphrase,
            } => {
                let passphrase = passphrase
                    .as_ref()
                    .map(|p| p.expose())
                    .filter(|p| !p.is_empty());
                self.backend
                    .ssh_key(ssh_username, public_key, private_key, passphrase)
            }
            CredentialDescription::EnvironmentPair { username, password } => {
                let (username, password) = self.resolver.resolve_pair(username, password)?;
                self.backend
                    .userpass_plaintext(username.expose(), password.expose())
            }
            CredentialDescription::EnvironmentToken { token } => {
                let token = self.resolver.resolve(token)?;
                self.backend.userpass_plaintext(TOKEN_USERNAME, token.expose())
            }
            CredentialDescription::UserPass { username, password } => {
                self.backend.userpass_plaintext(username, password.expose())
            }
        }
    }

    /// Whether another call with these allowed types could still succeed.
    ///
    /// Transports use this to stop challenging a session whose only option,
    /// the agent, is already spent.
    pub fn can_attempt(&self, session: &NegotiationSession, allowed: AllowedTypes) -> bool {
        let kind = session.description().kind();
        allowed.contains(kind.required_type())
            && !(matches!(session.description(), CredentialDescription::None)
                && session.agent_attempted())
    }
}
