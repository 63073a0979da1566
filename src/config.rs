use serde::{Deserialize, Deserializer, de::Error as _};

use crate::credential::CredentialDescription;
use crate::session::NegotiationSession;

/// Options of one transfer operation (clone, fetch).
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TransferConfig {
    /// Attach the progress reporter and print the clone banner.
    pub show_progress: bool,
    pub credentials: CredentialDescription,
    /// Upper bound on credential offers before the operation gives up.
    #[serde(deserialize_with = "string_or_usize")]
    pub max_auth_attempts: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            show_progress: false,
            credentials: CredentialDescription::None,
            max_auth_attempts: 16,
        }
    }
}

impl TransferConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Fresh session for one operation using these options.
    pub fn session(&self) -> NegotiationSession {
        NegotiationSession::new(self.credentials.clone())
    }
}

fn string_or_usize<'deserialize, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'deserialize>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrUSize {
        String(String),
        USize(usize),
    }

    match StringOrUSize::deserialize(deserializer)? {
        StringOrUSize::String(v) => v.trim().parse().map_err(D::Error::custom),
        StringOrUSize::USize(v) => Ok(v),
    }
}
