//! Authentication for docgate
//!
//! Provides:
//! - JWT token generation and validation
//! - The bearer-token gate in front of `/api/:resource`
//! - Login and registration against credential records
//! - Argon2id credential records

pub mod credentials;
pub mod gate;
pub mod jwt;
pub mod login;

pub use gate::{AuthGate, Principal};
pub use jwt::{extract_token_from_header, Claims, IssuedToken, JwtValidator, TokenValidationResult};
pub use login::{LoginPolicy, LoginRequest, LoginService, RegisterRequest};
pub use credentials::{new_record, verify_absent, verify_credential};
