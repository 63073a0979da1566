//! Resolution of credentials held in environment variables.
//!
//! Variable names are supplied by the caller. A variable that is unset, empty
//! or not valid UTF-8 is refused. Resolved values live in [`Secret`] buffers,
//! so a failure half-way through a multi-variable resolution releases whatever
//! was already copied.

use std::collections::HashMap;
use std::env;

use zeroize::Zeroizing;

use super::secret::Secret;
use crate::errors::AuthError;

/// Read access to a set of environment variables.
pub trait EnvSource {
    /// Value of `name`, or `None` when the variable is not set.
    fn var(&self, name: &str) -> Option<Zeroizing<String>>;
}

/// The environment of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<Zeroizing<String>> {
        let raw = env::var_os(name)?;
        match raw.into_string() {
            Ok(value) => Some(Zeroizing::new(value)),
            Err(_) => {
                tracing::warn!(var = name, "environment variable is not valid UTF-8");
                None
            }
        }
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<Zeroizing<String>> {
        self.get(name).map(|v| Zeroizing::new(v.clone()))
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, name: &str) -> Option<Zeroizing<String>> {
        (**self).var(name)
    }
}

/// Resolves named environment variables into [`Secret`]s.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentResolver<E = ProcessEnv> {
    source: E,
}

impl EnvironmentResolver<ProcessEnv> {
    pub fn new() -> Self {
        Self { source: ProcessEnv }
    }
}

impl<E: EnvSource> EnvironmentResolver<E> {
    pub fn with_source(source: E) -> Self {
        Self { source }
    }

    /// Resolve a single variable. Unset and empty are both `EnvVarUnset`.
    pub fn resolve(&self, name: &str) -> Result<Secret, AuthError> {
        let value = self
            .source
            .var(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::EnvVarUnset(name.to_string()))?;
        let secret = Secret::try_copy_from(&value)?;
        tracing::debug!(var = name, "resolved credential from environment");
        Ok(secret)
    }

    /// Resolve two variables, all-or-nothing.
    ///
    /// If the second lookup fails the first secret is dropped, and wiped,
    /// before the error is returned.
    pub fn resolve_pair(&self, first: &str, second: &str) -> Result<(Secret, Secret), AuthError> {
        let a = self.resolve(first)?;
        let b = self.resolve(second)?;
        Ok((a, b))
    }
}
