use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use super::secret::Secret;

/// Set of authentication schemes the remote currently accepts.
///
/// Bit values follow libgit2's `git_credential_t`, so a raw bitmask from the
/// transport can be wrapped as-is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllowedTypes(u32);

impl AllowedTypes {
    pub const USERPASS_PLAINTEXT: AllowedTypes = AllowedTypes(1 << 0);
    pub const SSH_KEY: AllowedTypes = AllowedTypes(1 << 1);
    pub const SSH_CUSTOM: AllowedTypes = AllowedTypes(1 << 2);
    pub const DEFAULT: AllowedTypes = AllowedTypes(1 << 3);
    pub const SSH_INTERACTIVE: AllowedTypes = AllowedTypes(1 << 4);
    pub const USERNAME: AllowedTypes = AllowedTypes(1 << 5);
    pub const SSH_MEMORY: AllowedTypes = AllowedTypes(1 << 6);

    const NAMES: [(AllowedTypes, &'static str); 7] = [
        (Self::USERPASS_PLAINTEXT, "userpass-plaintext"),
        (Self::SSH_KEY, "ssh-key"),
        (Self::SSH_CUSTOM, "ssh-custom"),
        (Self::DEFAULT, "default"),
        (Self::SSH_INTERACTIVE, "ssh-interactive"),
        (Self::USERNAME, "username"),
        (Self::SSH_MEMORY, "ssh-memory"),
    ];

    pub const fn empty() -> Self {
        AllowedTypes(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        AllowedTypes(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: AllowedTypes) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn without(self, other: AllowedTypes) -> Self {
        AllowedTypes(self.0 & !other.0)
    }
}

impl BitOr for AllowedTypes {
    type Output = AllowedTypes;

    fn bitor(self, rhs: Self) -> Self::Output {
        AllowedTypes(self.0 | rhs.0)
    }
}

impl BitOrAssign for AllowedTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AllowedTypes {
    type Output = AllowedTypes;

    fn bitand(self, rhs: Self) -> Self::Output {
        AllowedTypes(self.0 & rhs.0)
    }
}

impl fmt::Debug for AllowedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AllowedTypes({self})")
    }
}

impl fmt::Display for AllowedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        let unknown = self.0 & !Self::NAMES.iter().fold(0, |acc, (flag, _)| acc | flag.0);
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

/// Fieldless tag of a [`CredentialDescription`], safe to log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    None,
    SshKey,
    EnvironmentPair,
    EnvironmentToken,
    UserPass,
}

impl CredentialKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::None => "none",
            CredentialKind::SshKey => "ssh_key",
            CredentialKind::EnvironmentPair => "env",
            CredentialKind::EnvironmentToken => "token",
            CredentialKind::UserPass => "user_pass",
        }
    }

    /// The scheme a description of this kind has to find in the allowed types.
    pub const fn required_type(&self) -> AllowedTypes {
        match self {
            CredentialKind::None | CredentialKind::SshKey => AllowedTypes::SSH_KEY,
            CredentialKind::EnvironmentPair
            | CredentialKind::EnvironmentToken
            | CredentialKind::UserPass => AllowedTypes::USERPASS_PLAINTEXT,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied description of how to authenticate.
///
/// Immutable once built; the negotiator only reads it. The serde form is
/// internally tagged by `type`, e.g.
/// `{"type": "token", "token": "GITHUB_PAT"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialDescription {
    /// No credentials; the negotiator falls back to a single SSH agent attempt.
    #[default]
    None,
    /// SSH key pair on disk.
    SshKey {
        public_key: PathBuf,
        private_key: PathBuf,
        #[serde(default, deserialize_with = "empty_as_none")]
        passphrase: Option<Secret>,
    },
    /// Username and password read from the named environment variables.
    #[serde(rename = "env")]
    EnvironmentPair {
        username: String,
        password: String,
    },
    /// Personal access token read from the named environment variable.
    #[serde(rename = "token")]
    EnvironmentToken { token: String },
    /// Literal username and password.
    UserPass { username: String, password: Secret },
}

impl CredentialDescription {
    pub fn ssh_key(
        public_key: impl Into<PathBuf>,
        private_key: impl Into<PathBuf>,
        passphrase: Option<&str>,
    ) -> Self {
        CredentialDescription::SshKey {
            public_key: public_key.into(),
            private_key: private_key.into(),
            passphrase: passphrase.filter(|p| !p.is_empty()).map(Secret::from),
        }
    }

    pub fn env(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        CredentialDescription::EnvironmentPair {
            username: username_var.into(),
            password: password_var.into(),
        }
    }

    pub fn token(token_var: impl Into<String>) -> Self {
        CredentialDescription::EnvironmentToken {
            token: token_var.into(),
        }
    }

    pub fn user_pass(username: impl Into<String>, password: &str) -> Self {
        CredentialDescription::UserPass {
            username: username.into(),
            password: Secret::from(password),
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialDescription::None => CredentialKind::None,
            CredentialDescription::SshKey { .. } => CredentialKind::SshKey,
            CredentialDescription::EnvironmentPair { .. } => CredentialKind::EnvironmentPair,
            CredentialDescription::EnvironmentToken { .. } => CredentialKind::EnvironmentToken,
            CredentialDescription::UserPass { .. } => CredentialKind::UserPass,
        }
    }
}

/// Credential produced by the [`PlainBackend`](super::backend::PlainBackend).
///
/// It is what a pure-Rust transport receives; libgit2 users get a
/// `git2::Cred` from the `Git2Backend` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// Sign with a key held by the local SSH agent.
    SshAgent { username: String, socket: PathBuf },
    /// Sign with a key pair read from disk by the transport.
    SshKey {
        username: String,
        public_key: PathBuf,
        private_key: PathBuf,
        passphrase: Option<Secret>,
    },
    /// Plaintext username and password (also used for bearer tokens).
    UserPassPlaintext { username: String, password: Secret },
}

impl Credential {
    pub fn username(&self) -> &str {
        match self {
            Credential::SshAgent { username, .. }
            | Credential::SshKey { username, .. }
            | Credential::UserPassPlaintext { username, .. } => username,
        }
    }

    /// The scheme this credential answers.
    pub fn credential_type(&self) -> AllowedTypes {
        match self {
            Credential::SshAgent { .. } | Credential::SshKey { .. } => AllowedTypes::SSH_KEY,
            Credential::UserPassPlaintext { .. } => AllowedTypes::USERPASS_PLAINTEXT,
        }
    }

    pub fn private_key(&self) -> Option<&Path> {
        match self {
            Credential::SshKey { private_key, .. } => Some(private_key),
            _ => None,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Secret>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(Secret::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types_contains() {
        let allowed = AllowedTypes::SSH_KEY | AllowedTypes::USERNAME;
        assert!(allowed.contains(AllowedTypes::SSH_KEY));
        assert!(!allowed.contains(AllowedTypes::USERPASS_PLAINTEXT));
        assert!(!allowed.contains(AllowedTypes::empty()));
        assert!(!allowed.without(AllowedTypes::SSH_KEY).contains(AllowedTypes::SSH_KEY));
    }

    #[test]
    fn test_allowed_types_raw_bits() {
        assert_eq!(AllowedTypes::USERPASS_PLAINTEXT.bits(), 1);
        assert_eq!(AllowedTypes::SSH_KEY.bits(), 2);
        assert_eq!(AllowedTypes::from_bits(0b11), AllowedTypes::SSH_KEY | AllowedTypes::USERPASS_PLAINTEXT);
    }

    #[test]
    fn test_allowed_types_display() {
        let allowed = AllowedTypes::from_bits(0b11 | 1 << 12);
        assert_eq!(allowed.to_string(), "userpass-plaintext|ssh-key|0x1000");
        assert_eq!(AllowedTypes::empty().to_string(), "none");
    }

    #[test]
    fn test_empty_passphrase_is_none() {
        let desc = CredentialDescription::ssh_key("id_rsa.pub", "id_rsa", Some(""));
        match desc {
            CredentialDescription::SshKey { passphrase, .. } => assert!(passphrase.is_none()),
            _ => panic!("expected SshKey variant"),
        }
    }

    #[test]
    fn test_required_types() {
        assert_eq!(CredentialKind::None.required_type(), AllowedTypes::SSH_KEY);
        assert_eq!(CredentialKind::UserPass.required_type(), AllowedTypes::USERPASS_PLAINTEXT);
        assert_eq!(
            CredentialKind::EnvironmentToken.required_type(),
            AllowedTypes::USERPASS_PLAINTEXT
        );
    }

    #[test]
    fn test_deserialize_descriptions() {
        let desc: CredentialDescription =
            serde_json::from_str(r#"{"type":"token","token":"GIT_TOKEN"}"#).unwrap();
        assert_eq!(desc, CredentialDescription::token("GIT_TOKEN"));

        let desc: CredentialDescription = serde_json::from_str(
            r#"{"type":"ssh_key","public_key":"k.pub","private_key":"k","passphrase":""}"#,
        )
        .unwrap();
        assert_eq!(desc, CredentialDescription::ssh_key("k.pub", "k", None));

        let desc: CredentialDescription = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(desc.kind(), CredentialKind::None);
    }

    #[test]
    fn test_user_pass_debug_hides_password() {
        let desc = CredentialDescription::user_pass("alice", "s3cret");
        assert!(!format!("{:?}", desc).contains("s3cret"));
    }
}
