//! Dataset registry: a catalog of named datasets with budgeted, authorised reads
//! and a validated registration path.
pub mod api;
pub mod common;
pub mod data;
pub mod secrets;

pub use common::{ErrorCode, RegistryError, RegistryResult};
pub use data::Registry;
