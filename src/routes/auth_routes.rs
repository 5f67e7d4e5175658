//! HTTP routes for authentication
//!
//! - POST /api/login    - Exchange a username (and password) for a JWT
//! - POST /api/register - Create a credential record

use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::warn;

use crate::envelope::Envelope;
use crate::server::AppState;
use crate::types::GatewayError;

fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// POST /api/login
///
/// Body `{username, password?}` -> 200 `{token}`.
pub async fn handle_login(state: &AppState, body: &[u8]) -> Envelope {
    let result = match parse_json_body(body) {
        Ok(req) => state.login.login(req).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(issued) => Envelope::ok(json!({ "token": issued.token })),
        Err(err) => {
            warn!("Login failed: {}", err);
            err.into()
        }
    }
}

/// POST /api/register
///
/// Body `{username, password}` -> 201 `{message}`.
pub async fn handle_register(state: &AppState, body: &[u8]) -> Envelope {
    let result = match parse_json_body(body) {
        Ok(req) => state.login.register(req).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Envelope::message(StatusCode::CREATED, "user registered"),
        Err(err) => {
            warn!("Registration failed: {}", err);
            err.into()
        }
    }
}
