//! Owning secret buffer that is wiped when it goes out of scope.

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

use crate::errors::AuthError;

/// Owned secret string (password, token, passphrase).
///
/// The buffer is allocated with a fallible reservation and zeroized on drop,
/// so every exit path of the code that holds it releases the secret. `Debug`
/// never shows the content.
#[derive(PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Copy `value` into a freshly reserved buffer.
    pub fn try_copy_from(value: &str) -> Result<Self, AuthError> {
        let mut buf = String::new();
        buf.try_reserve_exact(value.len())
            .map_err(|_| AuthError::AllocationFailure)?;
        buf.push_str(value);
        live::acquire();
        Ok(Secret(Zeroizing::new(buf)))
    }

    /// Take ownership of an existing string without copying.
    pub fn new(value: String) -> Self {
        live::acquire();
        Secret(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Secret::new(self.0.as_str().to_string())
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        live::release();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::new(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::new(value)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret::new)
    }
}


#[cfg(not(test))]
mod live {
    #[inline]
    pub(crate) fn acquire() {}
    #[inline]
    pub(crate) fn release() {}
}
