//! Core dataset definitions and contracts.
//!
//! Field names follow the wire format callers already use (`dataset_name`,
//! `dataset_type`, `key`, ...), so records serialize without an adapter layer.
//!
//! TODO: Restrict dataset names (charset, length) once naming rules are agreed with clients.

use std::fmt;
use std::path::PathBuf;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::common::error::RegistryResult;

/// How a dataset is reached.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "local_csv")]
    LocalFile,
    #[serde(rename = "dataverse")]
    Dataverse,
}

impl SourceType {
    pub const ALL: [SourceType; 2] = [SourceType::LocalFile, SourceType::Dataverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::LocalFile => "local_csv",
            SourceType::Dataverse => "dataverse",
        }
    }

    /// Genuine membership check against the known types.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    /// The only capability key a dataset of this type may expose.
    pub fn capability(&self) -> CapabilityKey {
        match self {
            SourceType::LocalFile => CapabilityKey::CsvDetails,
            SourceType::Dataverse => CapabilityKey::DataverseDetails,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail payload a dataset exposes to readers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CapabilityKey {
    #[serde(rename = "csv_details")]
    CsvDetails,
    #[serde(rename = "dataverse_details")]
    DataverseDetails,
}

impl CapabilityKey {
    pub const KNOWN: [CapabilityKey; 2] = [CapabilityKey::CsvDetails, CapabilityKey::DataverseDetails];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKey::CsvDetails => "csv_details",
            CapabilityKey::DataverseDetails => "dataverse_details",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|k| k.as_str() == raw)
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the dataset content lives. Exactly one per dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    LocalPath(PathBuf),
    Host(String),
}

/// Name under which the credential of a remote dataset is kept in the secret store.
pub fn credential_ref(dataset_name: &str) -> String {
    format!("dataverse:{dataset_name}")
}

/// Catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "dataset_name")]
    pub name: String,
    #[serde(rename = "dataset_type")]
    pub source_type: SourceType,
    pub key: CapabilityKey,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_metadata_path: Option<PathBuf>,
    /// Canonical serialized schema, remote datasets only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Secret store name of the credential, never the credential itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    pub budget: f64,
}

impl Dataset {
    /// Local CSV dataset with the matching capability key.
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>, budget: f64) -> Self {
        Self {
            name: name.into(),
            source_type: SourceType::LocalFile,
            key: CapabilityKey::CsvDetails,
            location: Location::LocalPath(path.into()),
            local_metadata_path: None,
            schema: None,
            credential_ref: None,
            budget,
        }
    }

    /// Dataverse dataset; its credential is looked up under [`credential_ref`].
    pub fn dataverse(name: impl Into<String>, host: impl Into<String>, budget: f64) -> Self {
        let name = name.into();
        Self {
            credential_ref: Some(credential_ref(&name)),
            name,
            source_type: SourceType::Dataverse,
            key: CapabilityKey::DataverseDetails,
            location: Location::Host(host.into()),
            local_metadata_path: None,
            schema: None,
            budget,
        }
    }

    /// Secret store name to fetch before a read, if the dataset is remote.
    /// Always derived from the dataset name, never from caller input.
    pub fn secret_name(&self) -> Option<String> {
        match self.source_type {
            SourceType::LocalFile => None,
            SourceType::Dataverse => Some(credential_ref(&self.name)),
        }
    }
}

/// Result of a successful read.
///
/// Serializes as `{"dataset_type": .., "<key>": {..dataset, "token": ..}}` so
/// callers can destructure by the declared capability.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetDescriptor {
    /// Snapshot taken right after the debit.
    pub dataset: Dataset,
    /// Credential value fetched for this read only.
    pub token: Option<String>,
}

impl DatasetDescriptor {
    pub fn source_type(&self) -> SourceType {
        self.dataset.source_type
    }

    pub fn capability_key(&self) -> CapabilityKey {
        self.dataset.key
    }
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    #[serde(flatten)]
    dataset: &'a Dataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

impl Serialize for DatasetDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("dataset_type", &self.dataset.source_type)?;
        map.serialize_entry(
            self.dataset.key.as_str(),
            &SessionRecord {
                dataset: &self.dataset,
                token: self.token.as_deref(),
            },
        )?;
        map.end()
    }
}

/// Read request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub dataset_name: String,
    pub budget: f64,
}

/// Proposed dataset as submitted for registration. Nothing here is trusted
/// until the validation pipeline has run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub dataset_name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub dataset_type: Option<String>,
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    #[serde(default)]
    pub local_metadata_path: Option<PathBuf>,
    /// `Some(Value::Null)` when the field is present but null.
    #[serde(default, deserialize_with = "present_value")]
    pub schema: Option<Value>,
    #[serde(default)]
    pub host: Option<String>,
    /// Credential payload, either an object or a string holding JSON.
    #[serde(default)]
    pub token: Option<Value>,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl DatasetDefinition {
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>, budget: f64) -> Self {
        Self {
            dataset_name: name.into(),
            key: Some(CapabilityKey::CsvDetails.as_str().to_string()),
            budget: Some(budget),
            dataset_type: Some(SourceType::LocalFile.as_str().to_string()),
            local_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn dataverse(
        name: impl Into<String>,
        host: impl Into<String>,
        schema: Value,
        token: Value,
        budget: f64,
    ) -> Self {
        Self {
            dataset_name: name.into(),
            key: Some(CapabilityKey::DataverseDetails.as_str().to_string()),
            budget: Some(budget),
            dataset_type: Some(SourceType::Dataverse.as_str().to_string()),
            schema: Some(schema),
            host: Some(host.into()),
            token: Some(token),
            ..Self::default()
        }
    }
}

/// Contract for catalog storage. Each method is atomic on its own.
pub trait CatalogStore: Send + Sync {
    fn get(&self, name: &str) -> RegistryResult<Dataset>;
    fn contains(&self, name: &str) -> bool;
    /// Fails with `DuplicateName` if the name is taken.
    fn insert(&self, dataset: Dataset) -> RegistryResult<()>;
    fn update_budget(&self, name: &str, budget: f64) -> RegistryResult<()>;
    /// Check-and-subtract in one step; returns the remaining budget.
    fn debit(&self, name: &str, cost: f64) -> RegistryResult<f64>;
    fn len(&self) -> usize;
    fn names(&self) -> Vec<String>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
