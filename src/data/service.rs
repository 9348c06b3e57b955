//! Service layer: reads with budget accounting, and validated registration.
//!
//! TODO: Decide whether the debit should depend on the query type instead of a flat caller-supplied cost.

use std::sync::{Arc, Mutex, PoisonError};

use crate::common::config::AppCfg;
use crate::common::error::{RegistryError, RegistryResult};
use crate::secrets::SecretStore;

use super::catalog::MemoryCatalog;
use super::domain::{CatalogStore, Dataset, DatasetDefinition, DatasetDescriptor, ReadRequest};
use super::validate::Pipeline;

/// Owned registry instance. Construct once at startup and share by reference.
pub struct Registry {
    catalog: Box<dyn CatalogStore>,
    secrets: Arc<dyn SecretStore>,
    pipeline: Pipeline,
    /// Serialises registrations so uniqueness check and insert cannot interleave.
    register_lock: Mutex<()>,
}

impl Registry {
    /// Registry seeded with the built-in datasets.
    pub fn new(cfg: &AppCfg, secrets: Arc<dyn SecretStore>) -> Self {
        Self::with_parts(Box::new(MemoryCatalog::seeded(cfg)), secrets)
    }

    /// Registry with an empty catalog.
    pub fn empty(secrets: Arc<dyn SecretStore>) -> Self {
        Self::with_parts(Box::new(MemoryCatalog::new()), secrets)
    }

    pub fn with_parts(catalog: Box<dyn CatalogStore>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            catalog,
            secrets,
            pipeline: Pipeline::standard(),
            register_lock: Mutex::new(()),
        }
    }

    /// Authorise a read of `name` and debit `requested` from its budget.
    ///
    /// On any error the stored budget is unchanged.
    pub fn read(&self, name: &str, requested: f64) -> RegistryResult<DatasetDescriptor> {
        match self.try_read(name, requested) {
            Ok(descriptor) => {
                tracing::info!(
                    dataset = name,
                    requested,
                    remaining = descriptor.dataset.budget,
                    "read authorised"
                );
                Ok(descriptor)
            }
            Err(err) => {
                tracing::warn!(dataset = name, code = err.code().status(), "read rejected: {err}");
                Err(err)
            }
        }
    }

    pub fn read_request(&self, request: &ReadRequest) -> RegistryResult<DatasetDescriptor> {
        self.read(&request.dataset_name, request.budget)
    }

    fn try_read(&self, name: &str, requested: f64) -> RegistryResult<DatasetDescriptor> {
        if !requested.is_finite() || requested < 0.0 {
            return Err(RegistryError::invalid_budget(
                name,
                format!("requested budget {requested} must be a non-negative number"),
            ));
        }

        let mut dataset = self.catalog.get(name)?;

        let token = match dataset.secret_name() {
            Some(secret) => {
                let credential = self
                    .secrets
                    .get(&secret)
                    .map_err(|e| RegistryError::authorization(&secret, e.to_string()))?;
                Some(credential.value)
            }
            None => None,
        };

        dataset.budget = self.catalog.debit(name, requested)?;
        Ok(DatasetDescriptor { dataset, token })
    }

    /// Validate `definition` and admit it into the catalog.
    ///
    /// Nothing is written, to the catalog or the secret store, unless every check passes.
    pub fn register(&self, definition: DatasetDefinition) -> RegistryResult<Dataset> {
        let _guard = self
            .register_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.try_register(&definition) {
            Ok(dataset) => {
                tracing::info!(
                    dataset = %dataset.name,
                    dataset_type = %dataset.source_type,
                    budget = dataset.budget,
                    "dataset registered"
                );
                Ok(dataset)
            }
            Err(err) => {
                tracing::warn!(
                    dataset = %definition.dataset_name,
                    code = err.code().status(),
                    "registration rejected: {err}"
                );
                Err(err)
            }
        }
    }

    fn try_register(&self, definition: &DatasetDefinition) -> RegistryResult<Dataset> {
        let admission = self.pipeline.run(definition, self.catalog.as_ref())?;

        if let Some(credential) = admission.credential {
            let secret = credential.name.clone();
            self.secrets
                .put(credential)
                .map_err(|e| RegistryError::authorization(secret, e.to_string()))?;
        }

        self.catalog.insert(admission.dataset.clone())?;
        Ok(admission.dataset)
    }

    /// Snapshot of a catalog entry.
    pub fn get(&self, name: &str) -> RegistryResult<Dataset> {
        self.catalog.get(name)
    }

    pub fn remaining_budget(&self, name: &str) -> RegistryResult<f64> {
        self.catalog.get(name).map(|d| d.budget)
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.catalog.names()
    }
}
