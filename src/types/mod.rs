//! Shared types for docgate

pub mod error;
pub mod json;

pub use error::{GatewayError, Operation};
pub use json::{body_to_document, bson_to_json, document_to_json};
