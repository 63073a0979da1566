//! Construction of transport credentials.
//!
//! The negotiator decides *which* scheme to answer with; a
//! [`CredentialBackend`] builds the credential object the transport actually
//! consumes. This keeps the decision logic independent of libgit2.

use std::path::{Path, PathBuf};

use super::env::{EnvSource, ProcessEnv};
use super::secret::Secret;
use super::types::Credential;
use crate::errors::AuthError;

/// Environment variable naming the SSH agent socket.
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

/// Builds transport-specific credentials for the schemes the negotiator picks.
///
/// Implementations must not block or retry: each call is one attempt.
pub trait CredentialBackend {
    /// Credential object handed to the transport.
    type Credential;

    /// Credential backed by a key held in the local SSH agent.
    fn ssh_key_from_agent(&self, username: &str) -> Result<Self::Credential, AuthError>;

    /// Credential backed by a key pair on disk.
    fn ssh_key(
        &self,
        username: &str,
        public_key: &Path,
        private_key: &Path,
        passphrase: Option<&str>,
    ) -> Result<Self::Credential, AuthError>;

    /// Plaintext username/password credential.
    fn userpass_plaintext(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Credential, AuthError>;
}

/// Pure-Rust backend producing [`Credential`] values.
///
/// The agent is considered available when a socket path was found, usually
/// via `SSH_AUTH_SOCK`. Key files are not opened here; the transport reads
/// them when it signs.
#[derive(Clone, Debug, Default)]
pub struct PlainBackend {
    agent_socket: Option<PathBuf>,
}

impl PlainBackend {
    pub fn new(agent_socket: Option<PathBuf>) -> Self {
        Self { agent_socket }
    }

    /// Pick up the agent socket from the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Self {
        let agent_socket = source
            .var(SSH_AUTH_SOCK)
            .filter(|v| !v.is_empty())
            .map(|v| PathBuf::from(v.as_str()));
        Self { agent_socket }
    }

    pub fn agent_socket(&self) -> Option<&Path> {
        self.agent_socket.as_deref()
    }
}

impl CredentialBackend for PlainBackend {
    type Credential = Credential;

    fn ssh_key_from_agent(&self, username: &str) -> Result<Credential, AuthError> {
        let socket = self
            .agent_socket
            .clone()
            .ok_or_else(|| AuthError::AgentUnavailable(format!("{SSH_AUTH_SOCK} is not set")))?;
        Ok(Credential::SshAgent {
            username: username.to_string(),
            socket,
        })
    }

    fn ssh_key(
        &self,
        username: &str,
        public_key: &Path,
        private_key: &Path,
        passphrase: Option<&str>,
    ) -> Result<Credential, AuthError> {
        if private_key.as_os_str().is_empty() {
            return Err(AuthError::KeyLoadError(
                "private key path is empty".to_string(),
            ));
        }
        let passphrase = passphrase.map(Secret::try_copy_from).transpose()?;
        Ok(Credential::SshKey {
            username: username.to_string(),
            public_key: public_key.to_path_buf(),
            private_key: private_key.to_path_buf(),
            passphrase,
        })
    }

    fn userpass_plaintext(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        Ok(Credential::UserPassPlaintext {
            username: username.to_string(),
            password: Secret::try_copy_from(password)?,
        })
    }
}
