//! Secret store seam: the registry only ever sees `get` and `put`.

pub mod domain;
pub mod memory;

pub use domain::{Credential, SecretError, SecretStore};
pub use memory::MemorySecretStore;
