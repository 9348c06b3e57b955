//! JSON handlers for the two registry operations.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::common::error::{ErrorCode, RegistryError, RegistryResult};
use crate::data::domain::{DatasetDefinition, ReadRequest};
use crate::data::service::Registry;

/// Status-equivalent plus serialized body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status: ErrorCode::Ok.status(),
                body,
            },
            Err(e) => Self::failure(ErrorCode::Internal, &e.to_string()),
        }
    }

    fn error(err: &RegistryError) -> Self {
        Self::failure(err.code(), &err.to_string())
    }

    fn failure(code: ErrorCode, message: &str) -> Self {
        Self {
            status: code.status(),
            body: json!({ "error": code.as_str(), "message": message }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ErrorCode::Ok.status()
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> RegistryResult<T> {
    serde_json::from_str(body).map_err(|e| RegistryError::MalformedRequest {
        detail: e.to_string(),
    })
}

/// `{"dataset_name": .., "budget": ..}` -> dataset descriptor.
pub fn handle_read(registry: &Registry, body: &str) -> ApiResponse {
    match decode::<ReadRequest>(body).and_then(|req| registry.read_request(&req)) {
        Ok(descriptor) => ApiResponse::ok(&descriptor),
        Err(err) => ApiResponse::error(&err),
    }
}

/// Dataset definition -> stored dataset.
pub fn handle_register(registry: &Registry, body: &str) -> ApiResponse {
    match decode::<DatasetDefinition>(body).and_then(|def| registry.register(def)) {
        Ok(dataset) => ApiResponse::ok(&dataset),
        Err(err) => ApiResponse::error(&err),
    }
}
