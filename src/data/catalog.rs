//! In-memory catalog keyed by dataset name.
//!
//! A single mutex guards the whole map, so every check-then-mutate below is
//! atomic with respect to every other catalog call.
//!
//! TODO: Move to per-name locks if contention on the single map lock shows up under load.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::common::config::AppCfg;
use crate::common::error::{RegistryError, RegistryResult};

use super::domain::{CatalogStore, Dataset};

#[derive(Default)]
pub struct MemoryCatalog {
    entries: Mutex<HashMap<String, Dataset>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in datasets.
    pub fn seeded(cfg: &AppCfg) -> Self {
        let catalog = Self::new();
        {
            let mut entries = catalog.lock();
            for dataset in seed_datasets(cfg) {
                entries.insert(dataset.name.clone(), dataset);
            }
        }
        catalog
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Dataset>> {
        // No method panics while holding the guard, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `example` (local CSV) and `demo_dataverse`, both starting at the seed budget.
pub fn seed_datasets(cfg: &AppCfg) -> Vec<Dataset> {
    let example = Dataset::local("example", cfg.data_root.join("example.csv"), cfg.seed_budget);

    let mut demo = Dataset::dataverse("demo_dataverse", &cfg.dataverse_host, cfg.seed_budget);
    demo.local_metadata_path = Some(
        cfg.data_root
            .join("dataverse")
            .join("demo_dataverse.yml"),
    );

    vec![example, demo]
}

impl CatalogStore for MemoryCatalog {
    fn get(&self, name: &str) -> RegistryResult<Dataset> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    fn insert(&self, dataset: Dataset) -> RegistryResult<()> {
        let mut entries = self.lock();
        if entries.contains_key(&dataset.name) {
            return Err(RegistryError::DuplicateName { name: dataset.name });
        }
        entries.insert(dataset.name.clone(), dataset);
        Ok(())
    }

    fn update_budget(&self, name: &str, budget: f64) -> RegistryResult<()> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(RegistryError::invalid_budget(
                name,
                format!("budget {budget} must be a non-negative number"),
            ));
        }
        let mut entries = self.lock();
        let dataset = entries.get_mut(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;
        dataset.budget = budget;
        Ok(())
    }

    fn debit(&self, name: &str, cost: f64) -> RegistryResult<f64> {
        let mut entries = self.lock();
        let dataset = entries.get_mut(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;

        let adjusted = dataset.budget - cost;
        if adjusted < 0.0 {
            return Err(RegistryError::BudgetExceeded {
                name: name.to_string(),
                remaining: dataset.budget,
                requested: cost,
            });
        }
        dataset.budget = adjusted;
        Ok(adjusted)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
