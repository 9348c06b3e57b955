//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex, Once};

use dataset_registry::common::config::AppCfg;
use dataset_registry::common::log;
use dataset_registry::secrets::{Credential, MemorySecretStore, SecretError, SecretStore};
use dataset_registry::Registry;

static INIT: Once = Once::new();

#[allow(dead_code)]
pub fn init_test_logging() {
    INIT.call_once(|| {
        log::init(&AppCfg {
            log_level: "dataset_registry=debug".to_string(),
            ..AppCfg::default()
        });
    });
}

/// Secret store fake that records every call.
#[derive(Default)]
pub struct RecordingSecrets {
    inner: MemorySecretStore,
    puts: Mutex<Vec<Credential>>,
    gets: Mutex<Vec<String>>,
    fail_puts: bool,
}

#[allow(dead_code)]
impl RecordingSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_puts() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> Vec<Credential> {
        self.puts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }
}

impl SecretStore for RecordingSecrets {
    fn get(&self, name: &str) -> Result<Credential, SecretError> {
        self.gets.lock().unwrap().push(name.to_string());
        self.inner.get(name)
    }

    fn put(&self, credential: Credential) -> Result<(), SecretError> {
        self.puts.lock().unwrap().push(credential.clone());
        if self.fail_puts {
            return Err(SecretError::Unavailable("write refused".into()));
        }
        self.inner.put(credential)
    }
}

#[allow(dead_code)]
pub fn seeded_registry() -> (Registry, Arc<RecordingSecrets>) {
    init_test_logging();
    let secrets = Arc::new(RecordingSecrets::new());
    let registry = Registry::new(&AppCfg::default(), secrets.clone());
    (registry, secrets)
}
