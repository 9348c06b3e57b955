//! Process-local secret store, used when no external service is wired in.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::domain::{Credential, SecretError, SecretStore};

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for seeding a secret.
    pub fn with_secret(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, name: &str) -> Result<Credential, SecretError> {
        let secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        secrets
            .get(name)
            .map(|value| Credential::new(name, value.clone()))
            .ok_or_else(|| SecretError::NotFound {
                name: name.to_string(),
            })
    }

    fn put(&self, credential: Credential) -> Result<(), SecretError> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(credential.name, credential.value);
        Ok(())
    }
}
