//! HTTP routes for docgate
//!
//! Routing works on a fully read request (`HttpRequest`) so that every path
//! through the table ends in exactly one [`Envelope`].

pub mod api;
pub mod auth_routes;
pub mod health;

use bytes::Bytes;
use hyper::Method;

use crate::envelope::Envelope;
use crate::server::AppState;

pub use api::{handle_api_request, parse_api_path};
pub use auth_routes::{handle_login, handle_register};
pub use health::{health_check, readiness_check};

/// A request after its body has been collected
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {}", token));
        self
    }
}

/// Route a request to its handler
pub async fn route(state: &AppState, req: &HttpRequest) -> Envelope {
    match (&req.method, req.path.as_str()) {
        // Liveness probe
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => health_check(state),

        // Readiness probe - 200 only if the store answers
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => readiness_check(state).await,

        // Token issuance and registration are the only open /api routes
        (&Method::POST, "/api/login") => handle_login(state, &req.body).await,
        (&Method::POST, "/api/register") => handle_register(state, &req.body).await,

        (_, p) if p == "/api" || p.starts_with("/api/") => handle_api_request(state, req).await,

        _ => Envelope::route_not_found(),
    }
}
