//! Credential lookup, resolved at call time.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;

pub trait SecretProvider: Send + Sync {
    /// Current value of the named secret. Empty values count as missing.
    fn get(&self, name: &str) -> Option<SecretString>;
}

/// Reads secrets from the process environment on every lookup, so rotated
/// values are picked up without a restart.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

impl SecretProvider for EnvSecretProvider {
    fn get(&self, name: &str) -> Option<SecretString> {
        env::var(name)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretString::new)
    }
}

/// Fixed secrets, for tests and local runs.
#[derive(Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretProvider for StaticSecretProvider {
    fn get(&self, name: &str) -> Option<SecretString> {
        self.secrets
            .get(name)
            .filter(|value| !value.is_empty())
            .map(|value| SecretString::new(value.clone()))
    }
}
