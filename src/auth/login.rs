//! Token issuance and credential records
//!
//! Credentials live in a reserved collection of the document store as
//! `{username, password_hash, created_at}` documents with an Argon2id hash.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::credentials::{new_record, verify_absent, verify_credential};
use crate::auth::jwt::{IssuedToken, JwtValidator};
use crate::store::{DocumentStore, StoreErrorKind};
use crate::types::{GatewayError, Operation};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// How `login` treats the password field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPolicy {
    /// Any username gets a token, no password check. Development only.
    Passwordless,
    /// Password required and checked against the credential record
    Verified,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Issues tokens and manages credential records
#[derive(Clone)]
pub struct LoginService {
    jwt: JwtValidator,
    store: Arc<dyn DocumentStore>,
    collection: String,
    policy: LoginPolicy,
    registration_open: bool,
}

impl LoginService {
    pub fn new(
        jwt: JwtValidator,
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        policy: LoginPolicy,
    ) -> Self {
        Self {
            jwt,
            store,
            collection: collection.into(),
            policy,
            registration_open: false,
        }
    }

    /// Allow `register` to create accounts (closed by default)
    pub fn with_registration(mut self, open: bool) -> Self {
        self.registration_open = open;
        self
    }

    pub fn registration_open(&self) -> bool {
        self.registration_open
    }

    /// Exchange a username (and, under `Verified`, a password) for a token
    pub async fn login(&self, req: LoginRequest) -> Result<IssuedToken, GatewayError> {
        let username = req.username.trim();
        if username.is_empty() {
            return Err(GatewayError::BadRequest(
                "Missing required field: username".into(),
            ));
        }

        if self.policy == LoginPolicy::Verified {
            let password = req
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| GatewayError::BadRequest("Missing required field: password".into()))?;
            self.check_password(username, password).await?;
        }

        let issued = self.jwt.generate_token(username)?;
        info!(user = %username, policy = ?self.policy, "Token issued");
        Ok(issued)
    }

    /// Create a credential record
    pub async fn register(&self, req: RegisterRequest) -> Result<(), GatewayError> {
        if !self.registration_open {
            return Err(GatewayError::RegistrationClosed);
        }

        let username = req.username.trim();
        if username.is_empty() || req.password.is_empty() {
            return Err(GatewayError::BadRequest(
                "Missing required fields: username, password".into(),
            ));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(GatewayError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let existing = self
            .store
            .find_by_field(&self.collection, "username", username)
            .await
            .map_err(|e| GatewayError::store(Operation::Retrieve, e))?;
        if existing.is_some() {
            return Err(GatewayError::Conflict(
                "An account with this username already exists".into(),
            ));
        }

        let record = new_record(username, &req.password)?;

        match self.store.insert_one(&self.collection, record).await {
            Ok(_) => {
                info!(user = %username, "Registered new user");
                Ok(())
            }
            // Unique index caught a concurrent registration
            Err(e) if e.kind() == StoreErrorKind::Rejected && e.to_string().contains("E11000") => {
                Err(GatewayError::Conflict(
                    "An account with this username already exists".into(),
                ))
            }
            Err(e) => Err(GatewayError::store(Operation::Add, e)),
        }
    }

    async fn check_password(&self, username: &str, password: &str) -> Result<(), GatewayError> {
        let record = self
            .store
            .find_by_field(&self.collection, "username", username)
            .await
            .map_err(|e| GatewayError::store(Operation::Retrieve, e))?;

        let matched = match record {
            Some(record) => verify_credential(&record, password),
            None => verify_absent(password),
        };

        if matched {
            Ok(())
        } else {
            Err(GatewayError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service(policy: LoginPolicy) -> (LoginService, JwtValidator) {
        let jwt = JwtValidator::new_dev(3600);
        let service = LoginService::new(jwt.clone(), Arc::new(MemoryStore::new()), "users", policy)
            .with_registration(true);
        (service, jwt)
    }

    fn login(username: &str, password: Option<&str>) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.map(Into::into),
        }
    }

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_passwordless_login_accepts_any_username() {
        let (service, jwt) = service(LoginPolicy::Passwordless);

        let issued = service.login(login("alice", None)).await.unwrap();
        let claims = jwt.verify_token(&issued.token).claims.unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_requires_username() {
        let (service, _) = service(LoginPolicy::Passwordless);
        assert!(matches!(
            service.login(login("  ", None)).await,
            Err(GatewayError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_verified_login() {
        let (service, _) = service(LoginPolicy::Verified);
        service
            .register(register("alice", "correct-horse"))
            .await
            .unwrap();

        assert!(service
            .login(login("alice", Some("correct-horse")))
            .await
            .is_ok());
        assert!(matches!(
            service.login(login("alice", Some("wrong-password"))).await,
            Err(GatewayError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(login("bob", Some("correct-horse"))).await,
            Err(GatewayError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(login("alice", None)).await,
            Err(GatewayError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _) = service(LoginPolicy::Verified);

        assert!(matches!(
            service.register(register("alice", "short")).await,
            Err(GatewayError::BadRequest(_))
        ));
        assert!(matches!(
            service.register(register("", "long-enough")).await,
            Err(GatewayError::BadRequest(_))
        ));

        service.register(register("alice", "long-enough")).await.unwrap();
        assert!(matches!(
            service.register(register("alice", "another-one")).await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_registration_closed_by_default() {
        let store = Arc::new(MemoryStore::new());
        let service = LoginService::new(
            JwtValidator::new_dev(3600),
            store.clone(),
            "users",
            LoginPolicy::Verified,
        );
        assert!(!service.registration_open());

        assert!(matches!(
            service.register(register("alice", "long-enough")).await,
            Err(GatewayError::RegistrationClosed)
        ));
        assert_eq!(store.len("users"), 0);
    }

    #[tokio::test]
    async fn test_record_without_hash_rejects_login() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_one("users", bson::doc! { "username": "mallory" })
            .await
            .unwrap();
        let service = LoginService::new(
            JwtValidator::new_dev(3600),
            store,
            "users",
            LoginPolicy::Verified,
        );

        assert!(matches!(
            service.login(login("mallory", Some("anything"))).await,
            Err(GatewayError::InvalidCredentials)
        ));
    }
}
