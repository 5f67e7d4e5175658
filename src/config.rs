//! Configuration for docgate
//!
//! CLI arguments and environment variable handling using clap.
//! Every flag falls back to an environment variable; `.env` is loaded first.

use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::auth::{JwtValidator, LoginPolicy};
use crate::resource::ResourceRegistry;
use crate::types::GatewayError;

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

/// docgate - generic REST gateway over document-store collections
#[derive(Parser, Debug, Clone)]
#[command(name = "docgate")]
#[command(about = "Generic REST gateway over document-store collections")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Port override (replaces the port of LISTEN)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Document store backend
    #[arg(long, env = "STORE", value_enum, default_value = "mongodb")]
    pub store: StoreBackend,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "docgate")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Require a bearer token on /api/:resource routes
    #[arg(long, env = "AUTH_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub auth_enabled: bool,

    /// Enable development mode (passwordless login, dev JWT secret, memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Allow POST /api/register to create accounts
    #[arg(long, env = "REGISTRATION_OPEN", default_value = "false")]
    pub registration_open: bool,

    /// Comma-separated collections to serve (all collections when unset)
    #[arg(long, env = "RESOURCES")]
    pub resources: Option<String>,

    /// Comma-separated display names, e.g. "people=person,geese=goose"
    #[arg(long, env = "RESOURCE_LABELS")]
    pub resource_labels: Option<String>,

    /// Collection holding credential records (never served by /api)
    #[arg(long, env = "USERS_COLLECTION", default_value = "users")]
    pub users_collection: String,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "102400")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Effective listen address, with PORT applied
    pub fn listen_addr(&self) -> SocketAddr {
        let mut addr = self.listen;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        addr
    }

    /// Resource names from RESOURCES, if set
    pub fn resource_list(&self) -> Option<Vec<String>> {
        self.resources.as_ref().map(|list| {
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    /// Parse RESOURCE_LABELS into resource -> label pairs
    pub fn label_map(&self) -> Result<HashMap<String, String>, String> {
        let Some(raw) = self.resource_labels.as_deref() else {
            return Ok(HashMap::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((resource, label)) if !resource.trim().is_empty() => {
                    Ok((resource.trim().to_string(), label.trim().to_string()))
                }
                _ => Err(format!("Invalid RESOURCE_LABELS entry: '{}'", pair)),
            })
            .collect()
    }

    /// Registry built from RESOURCES and RESOURCE_LABELS, with the
    /// credentials collection reserved
    pub fn registry(&self) -> Result<ResourceRegistry, GatewayError> {
        let registry = match self.resource_list() {
            Some(names) => ResourceRegistry::allowlist(names),
            None => ResourceRegistry::open(),
        };

        let labels = self.label_map().map_err(GatewayError::Config)?;
        Ok(labels
            .into_iter()
            .fold(registry, |registry, (resource, label)| {
                registry.with_label(resource, label)
            })
            .reserve(self.users_collection.clone()))
    }

    /// JWT validator for this configuration (dev secret fallback in dev mode)
    pub fn jwt_validator(&self) -> Result<JwtValidator, GatewayError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev(self.jwt_expiry_seconds)),
            (None, false) => Err(GatewayError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Passwordless login is only ever allowed in dev mode
    pub fn login_policy(&self) -> LoginPolicy {
        if self.dev_mode {
            LoginPolicy::Passwordless
        } else {
            LoginPolicy::Verified
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if let Some(names) = self.resource_list() {
            if names.is_empty() {
                return Err("RESOURCES is set but lists no collections".to_string());
            }
            if names.contains(&self.users_collection) {
                return Err(format!(
                    "RESOURCES must not include the credentials collection '{}'",
                    self.users_collection
                ));
            }
        }

        self.label_map()?;
        Ok(())
    }
}
