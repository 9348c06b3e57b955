//! Contract consumed from the external secret store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named secret value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub value: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SecretError {
    #[error("secret {name} not found")]
    NotFound { name: String },
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

/// Interface for secret lookups and writes.
///
/// Calls are blocking and never retried by the registry.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Credential, SecretError>;
    fn put(&self, credential: Credential) -> Result<(), SecretError>;
}
