//! Request boundary: JSON bodies in, status-equivalent and JSON body out.
//!
//! Transport is left to the embedding service.

pub mod handlers;

pub use handlers::{handle_read, handle_register, ApiResponse};
