//! Credential records
//!
//! A record is `{username, password_hash, created_at}` in the credentials
//! collection. `password_hash` is an Argon2id PHC string carrying its own
//! salt and parameters.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use bson::{doc, DateTime, Document};
use tracing::warn;

use crate::types::GatewayError;

/// Field holding the PHC hash in a credential record
pub const PASSWORD_HASH_FIELD: &str = "password_hash";

fn hash(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GatewayError::Auth(format!("Failed to hash password: {e}")))
}

fn matches(password: &str, phc: &str) -> Option<bool> {
    let parsed = PasswordHash::new(phc).ok()?;
    Some(
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
    )
}

/// Build a credential record for a new account, with a freshly salted hash
pub fn new_record(username: &str, password: &str) -> Result<Document, GatewayError> {
    Ok(doc! {
        "username": username,
        PASSWORD_HASH_FIELD: hash(password)?,
        "created_at": DateTime::now(),
    })
}

/// Check `password` against a stored record.
///
/// A record with a missing or unparseable hash never matches.
pub fn verify_credential(record: &Document, password: &str) -> bool {
    let Ok(phc) = record.get_str(PASSWORD_HASH_FIELD) else {
        warn!("Credential record has no usable {}", PASSWORD_HASH_FIELD);
        return verify_absent(password);
    };

    matches(password, phc).unwrap_or_else(|| {
        warn!("Credential record holds a malformed password hash");
        false
    })
}

/// Spend the same Argon2 work as a real check for a username with no record,
/// so response time does not reveal which accounts exist. Always false.
pub fn verify_absent(password: &str) -> bool {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();

    if let Some(phc) = DUMMY.get_or_init(|| hash("docgate-no-such-account").ok()) {
        let _ = matches(password, phc);
    }
    false
}
