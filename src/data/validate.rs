//! Registration validation pipeline.
//!
//! Checks run in a fixed order and the first failure wins. Checks only
//! inspect the definition and fill in a [`Draft`]; side effects (secret
//! store write, catalog insert) belong to the caller once the pipeline passes.

use std::fs::{self, File};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::common::error::{RegistryError, RegistryResult};
use crate::secrets::Credential;

use super::domain::{
    credential_ref, CapabilityKey, CatalogStore, Dataset, DatasetDefinition, Location, SourceType,
};

/// Normalised values gathered while checks run.
#[derive(Debug)]
pub struct Draft<'a> {
    pub definition: &'a DatasetDefinition,
    pub key: Option<CapabilityKey>,
    pub budget: Option<f64>,
    pub source_type: Option<SourceType>,
    pub location: Option<Location>,
    pub schema: Option<String>,
    pub credential: Option<Credential>,
}

impl<'a> Draft<'a> {
    fn new(definition: &'a DatasetDefinition) -> Self {
        Self {
            definition,
            key: None,
            budget: None,
            source_type: None,
            location: None,
            schema: None,
            credential: None,
        }
    }

    fn name(&self) -> &str {
        &self.definition.dataset_name
    }
}

/// A definition that passed every check.
#[derive(Clone, Debug, PartialEq)]
pub struct Admission {
    pub dataset: Dataset,
    /// Credential to hand to the secret store before the dataset is inserted.
    pub credential: Option<Credential>,
}

/// One named step of the pipeline.
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, draft: &mut Draft<'_>, catalog: &dyn CatalogStore) -> RegistryResult<()>;
}

/// Ordered chain of checks.
pub struct Pipeline {
    checks: Vec<Box<dyn Check>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// Uniqueness, key, budget, type, location, credential.
    pub fn standard() -> Self {
        Self {
            checks: vec![
                Box::new(UniqueName),
                Box::new(KnownCapabilityKey),
                Box::new(PositiveBudget),
                Box::new(KnownSourceType),
                Box::new(ValidLocation),
                Box::new(CredentialPresent),
            ],
        }
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn run(
        &self,
        definition: &DatasetDefinition,
        catalog: &dyn CatalogStore,
    ) -> RegistryResult<Admission> {
        let mut draft = Draft::new(definition);
        for check in &self.checks {
            tracing::debug!(check = check.name(), dataset = %definition.dataset_name, "running check");
            check.run(&mut draft, catalog)?;
        }
        admit(draft)
    }
}

fn admit(draft: Draft<'_>) -> RegistryResult<Admission> {
    let (Some(key), Some(budget), Some(source_type), Some(location)) =
        (draft.key, draft.budget, draft.source_type, draft.location)
    else {
        return Err(RegistryError::MalformedRequest {
            detail: format!(
                "validation of {} did not resolve key, budget, type and location",
                draft.definition.dataset_name
            ),
        });
    };

    let definition = draft.definition;
    let credential = draft.credential;
    let dataset = Dataset {
        name: definition.dataset_name.clone(),
        source_type,
        key,
        location,
        local_metadata_path: definition.local_metadata_path.clone(),
        schema: draft.schema,
        credential_ref: credential.as_ref().map(|c| c.name.clone()),
        budget,
    };

    Ok(Admission {
        dataset,
        credential,
    })
}

pub struct UniqueName;

impl Check for UniqueName {
    fn name(&self) -> &'static str {
        "unique_name"
    }

    fn run(&self, draft: &mut Draft<'_>, catalog: &dyn CatalogStore) -> RegistryResult<()> {
        if catalog.contains(draft.name()) {
            return Err(RegistryError::DuplicateName {
                name: draft.name().to_string(),
            });
        }
        Ok(())
    }
}

pub struct KnownCapabilityKey;

impl Check for KnownCapabilityKey {
    fn name(&self) -> &'static str {
        "capability_key"
    }

    fn run(&self, draft: &mut Draft<'_>, _: &dyn CatalogStore) -> RegistryResult<()> {
        let given = draft.definition.key.as_deref();
        let key = given
            .and_then(CapabilityKey::parse)
            .ok_or_else(|| RegistryError::UnknownCapabilityKey {
                key: given.unwrap_or("<missing>").to_string(),
                reason: "must be either csv_details or dataverse_details.".to_string(),
            })?;
        draft.key = Some(key);
        Ok(())
    }
}

pub struct PositiveBudget;

impl Check for PositiveBudget {
    fn name(&self) -> &'static str {
        "budget"
    }

    fn run(&self, draft: &mut Draft<'_>, _: &dyn CatalogStore) -> RegistryResult<()> {
        let budget = match draft.definition.budget {
            None => return Err(RegistryError::invalid_budget(draft.name(), "Must specify a budget")),
            Some(b) if !b.is_finite() => {
                return Err(RegistryError::invalid_budget(draft.name(), "Budget must be finite."))
            }
            Some(b) if b <= 0.0 => {
                return Err(RegistryError::invalid_budget(
                    draft.name(),
                    "Budget must be greater than 0.",
                ))
            }
            Some(b) => b,
        };
        draft.budget = Some(budget);
        Ok(())
    }
}

pub struct KnownSourceType;

impl Check for KnownSourceType {
    fn name(&self) -> &'static str {
        "source_type"
    }

    fn run(&self, draft: &mut Draft<'_>, _: &dyn CatalogStore) -> RegistryResult<()> {
        let given = draft.definition.dataset_type.as_deref();
        let source_type = given
            .and_then(SourceType::parse)
            .ok_or_else(|| RegistryError::UnknownSourceType {
                given: given.unwrap_or("<missing>").to_string(),
            })?;

        if let Some(key) = draft.key {
            if key != source_type.capability() {
                return Err(RegistryError::UnknownCapabilityKey {
                    key: key.to_string(),
                    reason: format!(
                        "which does not match dataset type {source_type}; expected {}.",
                        source_type.capability()
                    ),
                });
            }
        }
        draft.source_type = Some(source_type);
        Ok(())
    }
}

pub struct ValidLocation;

impl ValidLocation {
    fn check_local(path: &Path) -> RegistryResult<()> {
        let readable = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
            && File::open(path).is_ok();
        if readable {
            Ok(())
        } else {
            Err(RegistryError::LocalResourceNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn canonical_schema(name: &str, schema: &Value) -> RegistryResult<String> {
        if is_empty_schema(schema) {
            return Err(RegistryError::MissingSchema {
                name: name.to_string(),
            });
        }

        // Strings are raw schemas, not pre-serialized JSON.
        serde_json::to_string(schema).map_err(|e| RegistryError::InvalidSchema {
            name: name.to_string(),
            detail: e.to_string(),
        })
    }
}

/// Falsy values count as no schema at all.
fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

impl Check for ValidLocation {
    fn name(&self) -> &'static str {
        "location"
    }

    fn run(&self, draft: &mut Draft<'_>, _: &dyn CatalogStore) -> RegistryResult<()> {
        let definition = draft.definition;
        let name = definition.dataset_name.as_str();
        let source_type = draft.source_type;

        if let Some(path) = &definition.local_path {
            Self::check_local(path)?;
            if source_type == Some(SourceType::Dataverse) {
                return Err(RegistryError::MissingLocation {
                    name: name.to_string(),
                    expected: "host and schema instead of local_path".to_string(),
                });
            }
            draft.location = Some(Location::LocalPath(path.clone()));
        } else if let Some(schema) = &definition.schema {
            let canonical = Self::canonical_schema(name, schema)?;

            let host = definition
                .host
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| RegistryError::InvalidHost {
                    name: name.to_string(),
                    given: definition.host.clone(),
                })?;

            if source_type == Some(SourceType::LocalFile) {
                return Err(RegistryError::MissingLocation {
                    name: name.to_string(),
                    expected: "local_path".to_string(),
                });
            }
            draft.schema = Some(canonical);
            draft.location = Some(Location::Host(host.to_string()));
        } else {
            return Err(RegistryError::MissingLocation {
                name: name.to_string(),
                expected: "either local_path or schema and host".to_string(),
            });
        }
        Ok(())
    }
}

/// Shape of the `token` field.
#[derive(Deserialize)]
struct TokenPayload {
    #[serde(default)]
    name: Option<String>,
    value: String,
}

pub struct CredentialPresent;

impl CredentialPresent {
    fn parse(name: &str, token: &Value) -> RegistryResult<Credential> {
        let missing = |detail: String| RegistryError::MissingCredential {
            name: name.to_string(),
            detail,
        };

        let payload: TokenPayload = match token {
            Value::Null => return Err(missing("no token supplied".to_string())),
            Value::String(raw) if raw.trim().is_empty() => {
                return Err(missing("no token supplied".to_string()))
            }
            Value::String(raw) => serde_json::from_str(raw)
                .map_err(|e| missing(format!("token is not a credential payload: {e}")))?,
            other => serde_json::from_value(other.clone())
                .map_err(|e| missing(format!("token is not a credential payload: {e}")))?,
        };

        if payload.value.is_empty() {
            return Err(missing("token value is empty".to_string()));
        }

        // The secret is always filed under the dataset's own reference.
        let secret_name = credential_ref(name);
        if let Some(given) = payload.name.filter(|n| !n.trim().is_empty()) {
            if given != secret_name {
                return Err(missing(format!(
                    "token names secret {given}, expected {secret_name}"
                )));
            }
        }
        Ok(Credential::new(secret_name, payload.value))
    }
}

impl Check for CredentialPresent {
    fn name(&self) -> &'static str {
        "credential"
    }

    fn run(&self, draft: &mut Draft<'_>, _: &dyn CatalogStore) -> RegistryResult<()> {
        if draft.source_type != Some(SourceType::Dataverse) {
            return Ok(());
        }
        let token = draft.definition.token.as_ref().unwrap_or(&Value::Null);
        draft.credential = Some(Self::parse(draft.name(), token)?);
        Ok(())
    }
}
