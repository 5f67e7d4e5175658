//! JSON <-> BSON conversion at the HTTP boundary
//!
//! Request bodies arrive as JSON objects and are stored verbatim. Responses
//! render ObjectIds as plain hex strings; every other BSON value uses relaxed
//! extended JSON.

use bson::{Bson, Document};
use serde_json::{Map, Value};

use crate::types::GatewayError;

/// Parse a request body into a document.
///
/// An empty body is an empty document. Anything other than a JSON object is
/// rejected.
pub fn body_to_document(body: &[u8]) -> Result<Document, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    match value {
        Value::Object(map) => object_to_document(&map),
        _ => Err(GatewayError::BadRequest(
            "Invalid JSON body: expected an object".into(),
        )),
    }
}

/// Convert a JSON object into a BSON document
pub fn object_to_document(map: &Map<String, Value>) -> Result<Document, GatewayError> {
    bson::to_document(map)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Render a BSON document as JSON
pub fn document_to_json(doc: &Document) -> Value {
    let map = doc
        .iter()
        .map(|(key, value)| (key.clone(), bson_to_json(value)))
        .collect::<Map<String, Value>>();
    Value::Object(map)
}

/// Render a single BSON value as JSON
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}
