//! Error handling primitives shared across the registry.
//!
//! Every failure is a rejected request: nothing here is retried or recovered.
//!
//! TODO: Split `MalformedRequest` into per-field variants once the JSON boundary reports field paths.

use std::path::PathBuf;

use thiserror::Error;

/// Stable status-equivalent codes reported at the request boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 200,
    /// Dataset name is not in the catalog.
    NotFound = 400,
    /// Dataset name is already registered.
    DuplicateName = 401,
    /// Capability key is not one of the known keys.
    UnknownCapabilityKey = 402,
    /// Budget is missing, non-positive or not a number.
    InvalidBudget = 403,
    /// Source type is not one of the known types.
    UnknownSourceType = 405,
    /// Local resource does not exist or cannot be read.
    LocalResourceNotFound = 406,
    /// Schema could not be brought into canonical form.
    InvalidSchema = 407,
    /// Remote host is missing or blank.
    InvalidHost = 408,
    /// Neither a local path nor a remote schema was supplied.
    MissingLocation = 409,
    /// Remote dataset definition has no usable credential.
    MissingCredential = 410,
    /// Remaining budget is lower than the requested cost.
    BudgetExceeded = 412,
    /// Schema field is present but empty.
    MissingSchema = 414,
    /// Request body could not be decoded.
    MalformedRequest = 422,
    /// Secret store lookup or write failed.
    AuthorizationFailure = 424,
    /// Response could not be produced.
    Internal = 500,
}

impl ErrorCode {
    /// Symbolic name used in serialized error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::NotFound => "not_found",
            ErrorCode::DuplicateName => "duplicate_name",
            ErrorCode::UnknownCapabilityKey => "unknown_capability_key",
            ErrorCode::InvalidBudget => "invalid_budget",
            ErrorCode::UnknownSourceType => "unknown_source_type",
            ErrorCode::LocalResourceNotFound => "local_resource_not_found",
            ErrorCode::InvalidSchema => "invalid_schema",
            ErrorCode::InvalidHost => "invalid_host",
            ErrorCode::MissingLocation => "missing_location",
            ErrorCode::MissingCredential => "missing_credential",
            ErrorCode::BudgetExceeded => "budget_exceeded",
            ErrorCode::MissingSchema => "missing_schema",
            ErrorCode::MalformedRequest => "malformed_request",
            ErrorCode::AuthorizationFailure => "authorization_failure",
            ErrorCode::Internal => "internal",
        }
    }

    /// Numeric status-equivalent.
    pub fn status(&self) -> u16 {
        *self as u32 as u16
    }
}

/// Canonical error type for the registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Dataset id {name} not found.")]
    NotFound { name: String },

    #[error("Not enough budget for read of {name}. Remaining budget: {remaining}, requested: {requested}")]
    BudgetExceeded {
        name: String,
        remaining: f64,
        requested: f64,
    },

    #[error("Dataset id {name} already exists. Identifiers must be unique")]
    DuplicateName { name: String },

    /// Also raised when the key does not belong to the declared source type.
    #[error("Given key was {key}, {reason}")]
    UnknownCapabilityKey { key: String, reason: String },

    #[error("Invalid budget for {name}: {reason}")]
    InvalidBudget { name: String, reason: String },

    #[error("Given type was {given}, must be either local_csv or dataverse.")]
    UnknownSourceType { given: String },

    #[error("Local file path {} does not exist or is not readable.", .path.display())]
    LocalResourceNotFound { path: PathBuf },

    #[error("Schema for {name} must be valid json: {detail}")]
    InvalidSchema { name: String, detail: String },

    #[error("Schema for {name} must exist.")]
    MissingSchema { name: String },

    #[error("Must specify host for {name}, {given:?} is malformed.")]
    InvalidHost { name: String, given: Option<String> },

    #[error("Dataset {name} must specify {expected}.")]
    MissingLocation { name: String, expected: String },

    #[error("Dataset {name} must contain a token field with a secret: {detail}")]
    MissingCredential { name: String, detail: String },

    #[error("Secret store rejected {secret}: {detail}")]
    AuthorizationFailure { secret: String, detail: String },

    /// Only produced at the JSON boundary.
    #[error("Malformed request: {detail}")]
    MalformedRequest { detail: String },
}

/// Result alias used throughout the crate.
pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::NotFound { .. } => ErrorCode::NotFound,
            RegistryError::BudgetExceeded { .. } => ErrorCode::BudgetExceeded,
            RegistryError::DuplicateName { .. } => ErrorCode::DuplicateName,
            RegistryError::UnknownCapabilityKey { .. } => ErrorCode::UnknownCapabilityKey,
            RegistryError::InvalidBudget { .. } => ErrorCode::InvalidBudget,
            RegistryError::UnknownSourceType { .. } => ErrorCode::UnknownSourceType,
            RegistryError::LocalResourceNotFound { .. } => ErrorCode::LocalResourceNotFound,
            RegistryError::InvalidSchema { .. } => ErrorCode::InvalidSchema,
            RegistryError::MissingSchema { .. } => ErrorCode::MissingSchema,
            RegistryError::InvalidHost { .. } => ErrorCode::InvalidHost,
            RegistryError::MissingLocation { .. } => ErrorCode::MissingLocation,
            RegistryError::MissingCredential { .. } => ErrorCode::MissingCredential,
            RegistryError::AuthorizationFailure { .. } => ErrorCode::AuthorizationFailure,
            RegistryError::MalformedRequest { .. } => ErrorCode::MalformedRequest,
        }
    }

    /// Secret store helper.
    pub fn authorization(secret: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::AuthorizationFailure {
            secret: secret.into(),
            detail: detail.into(),
        }
    }

    /// Budget helper.
    pub fn invalid_budget(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBudget {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
