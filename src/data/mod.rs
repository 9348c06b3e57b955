//! Data domain: catalog, registration pipeline and budgeted reads.

pub mod catalog;
pub mod domain;
pub mod service;
pub mod validate;

pub use domain::{
    CapabilityKey, Dataset, DatasetDefinition, DatasetDescriptor, Location, ReadRequest, SourceType,
};
pub use service::Registry;
