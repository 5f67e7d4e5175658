//! Response envelope
//!
//! Every request ends in exactly one `Envelope`, built either from a successful
//! store outcome or from a [`GatewayError`]. Error bodies always carry a
//! `message`; store detail is attached as `error` only for 500s.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

use crate::types::GatewayError;

/// Uniform `{status, body}` response shape
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub body: Value,
}

impl Envelope {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 with an arbitrary body
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// 201 with an arbitrary body
    pub fn created(body: Value) -> Self {
        Self::new(StatusCode::CREATED, body)
    }

    /// `{message}` body with the given status
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "message": message.into() }))
    }

    /// 404 `{message: "Route not found"}`
    pub fn route_not_found() -> Self {
        GatewayError::RouteNotFound.into()
    }

    /// Build the HTTP response
    pub fn into_response(self, request_id: &str) -> Response<Full<Bytes>> {
        let body = serde_json::to_vec(&self.body).unwrap_or_else(|_| b"{}".to_vec());

        let mut builder = Response::builder()
            .status(self.status)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Authorization");
        if !request_id.is_empty() {
            builder = builder.header("X-Request-Id", request_id);
        }

        builder
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|_| internal_error_response())
    }
}

impl From<GatewayError> for Envelope {
    fn from(err: GatewayError) -> Self {
        let status = err.status_code();
        let mut body = json!({ "message": err.message() });

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let Some(detail) = err.detail() {
                body["error"] = Value::String(detail);
            }
        }

        Self { status, body }
    }
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", hyper::header::HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        hyper::header::HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        hyper::header::HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert("Access-Control-Max-Age", hyper::header::HeaderValue::from_static("86400"));
    response
}

fn internal_error_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"message":"Internal server error"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::types::Operation;
    use http_body_util::BodyExt;

    #[test]
    fn test_not_found_envelope() {
        let env: Envelope = GatewayError::NotFound("widget".into()).into();
        assert_eq!(env.status, StatusCode::NOT_FOUND);
        assert_eq!(env.body, json!({ "message": "widget not found" }));
    }

    #[test]
    fn test_route_not_found() {
        let env = Envelope::route_not_found();
        assert_eq!(env.status, StatusCode::NOT_FOUND);
        assert_eq!(env.body, json!({ "message": "Route not found" }));
    }

    #[test]
    fn test_store_error_includes_detail() {
        let env: Envelope =
            GatewayError::store(Operation::Update, StoreError::unavailable("connection reset"))
                .into();
        assert_eq!(env.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            env.body,
            json!({ "message": "Error updating data", "error": "connection reset" })
        );
    }

    #[test]
    fn test_client_errors_never_include_detail() {
        for err in [
            GatewayError::MissingToken,
            GatewayError::InvalidToken("Token expired".into()),
            GatewayError::InvalidIdentifier("abc".into()),
            GatewayError::BadRequest("Invalid JSON body: eof".into()),
        ] {
            let env: Envelope = err.into();
            assert!(env.status.is_client_error());
            assert!(env.body.get("message").is_some());
            assert!(env.body.get("error").is_none());
        }
    }

    #[tokio::test]
    async fn test_into_response() {
        let response = Envelope::created(json!({ "message": "widget added" }))
            .into_response("req-1");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["Content-Type"], "application/json");
        assert_eq!(response.headers()["X-Request-Id"], "req-1");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "widget added");
    }

    #[test]
    fn test_preflight() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .get("Access-Control-Allow-Methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("DELETE"));
    }
}
