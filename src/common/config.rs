//! Runtime configuration loaded from the environment.
//!
//! TODO: Layer an optional key=value file under the environment variables.

use std::env;
use std::path::PathBuf;

/// Host of the built-in Dataverse dataset.
pub const DEFAULT_DATAVERSE_HOST: &str = "https://demo.dataverse.org/api/access/datafile/395811";

/// Snapshot of configuration values consumed by the registry.
#[derive(Clone, Debug)]
pub struct AppCfg {
    /// Directory holding the files of the seed datasets.
    pub data_root: PathBuf,
    pub dataverse_host: String,
    pub seed_budget: f64,
    /// `EnvFilter` directive, e.g. `info` or `dataset_registry=debug`.
    pub log_level: String,
    pub log_json: bool,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./datasets"),
            dataverse_host: DEFAULT_DATAVERSE_HOST.to_string(),
            seed_budget: 3.0,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        let defaults = Self::default();

        fn env_opt(key: &str) -> Option<String> {
            env::var(key).ok().filter(|v| !v.trim().is_empty())
        }

        Self {
            data_root: env_opt("DATASET_REGISTRY_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            dataverse_host: env_opt("DATASET_REGISTRY_DATAVERSE_HOST")
                .unwrap_or(defaults.dataverse_host),
            seed_budget: env_opt("DATASET_REGISTRY_SEED_BUDGET")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|b| b.is_finite() && *b >= 0.0)
                .unwrap_or(defaults.seed_budget),
            log_level: env_opt("DATASET_REGISTRY_LOG").unwrap_or(defaults.log_level),
            log_json: env_opt("DATASET_REGISTRY_LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.log_json),
        }
    }
}
