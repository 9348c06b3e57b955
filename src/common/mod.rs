//! Shared utilities that glue the registry domains together.
pub mod config;
pub mod error;
pub mod log;

pub use error::{ErrorCode, RegistryError, RegistryResult};
