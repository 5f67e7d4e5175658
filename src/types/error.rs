//! Error types for docgate
//!
//! Every failure inside the gateway is a `GatewayError`. The response
//! normalizer turns it into exactly one JSON envelope at the request boundary.

use hyper::StatusCode;

use crate::store::StoreError;

/// Store operation a failure happened in, used to phrase the 500 message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Retrieve,
    Add,
    Update,
    Delete,
}

impl Operation {
    /// Gerund used in "Error <verb> data"
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieving",
            Self::Add => "adding",
            Self::Update => "updating",
            Self::Delete => "deleting",
        }
    }
}

/// Main error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Route not found")]
    RouteNotFound,

    #[error("Invalid id: {0}")]
    InvalidIdentifier(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Access denied. No token provided")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("Registration is closed")]
    RegistrationClosed,

    #[error("Error {} data: {source}", .operation.verb())]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Wrap a store failure with the operation it interrupted
    pub fn store(operation: Operation, source: StoreError) -> Self {
        Self::Store { operation, source }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingToken => StatusCode::FORBIDDEN,
            Self::InvalidToken(_) => StatusCode::FORBIDDEN,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RegistrationClosed => StatusCode::FORBIDDEN,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message placed in the envelope body
    pub fn message(&self) -> String {
        match self {
            Self::Store { operation, .. } => format!("Error {} data", operation.verb()),
            Self::InvalidToken(_) => "Invalid token".to_string(),
            Self::Config(_) | Self::Auth(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Underlying detail, only exposed for 500s
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Store { source, .. } => Some(source.to_string()),
            Self::Config(m) | Self::Auth(m) | Self::Internal(m) => Some(m.clone()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
