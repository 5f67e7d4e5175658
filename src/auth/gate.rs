//! Bearer token gate for protected routes

use tracing::debug;

use crate::auth::jwt::{extract_token_from_header, JwtValidator};
use crate::types::GatewayError;

/// Verified identity attached to a request after the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub expires_at: u64,
}

/// Verifies `Authorization: Bearer <token>` before dispatch
#[derive(Debug, Clone)]
pub struct AuthGate {
    validator: JwtValidator,
}

impl AuthGate {
    pub fn new(validator: JwtValidator) -> Self {
        Self { validator }
    }

    /// Check the Authorization header value.
    ///
    /// No bearer token fails with `MissingToken`; a bad signature, malformed
    /// token or expired token fails with `InvalidToken`.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Principal, GatewayError> {
        let token = extract_token_from_header(authorization).ok_or(GatewayError::MissingToken)?;

        let result = self.validator.verify_token(token);
        match result.claims {
            Some(claims) if result.valid => {
                debug!(user = %claims.sub, "Token verified");
                Ok(Principal {
                    username: claims.sub,
                    expires_at: claims.exp,
                })
            }
            _ => Err(GatewayError::InvalidToken(
                result.error.unwrap_or_else(|| "Invalid token".into()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{unix_now, Claims};

    fn validator() -> JwtValidator {
        JwtValidator::new("gate-test-secret-at-least-32-characters!".into(), 3600).unwrap()
    }

    #[test]
    fn test_missing_header() {
        let gate = AuthGate::new(validator());
        assert!(matches!(gate.verify(None), Err(GatewayError::MissingToken)));
        assert!(matches!(
            gate.verify(Some("Basic dXNlcjpwYXNz")),
            Err(GatewayError::MissingToken)
        ));
    }

    #[test]
    fn test_fresh_token_accepted() {
        let validator = validator();
        let issued = validator.generate_token("alice").unwrap();
        let gate = AuthGate::new(validator);

        let principal = gate
            .verify(Some(&format!("Bearer {}", issued.token)))
            .unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.expires_at, issued.expires_at);
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = validator();
        let now = unix_now().unwrap();
        let token = validator
            .sign(&Claims {
                sub: "alice".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        let gate = AuthGate::new(validator);

        let err = gate.verify(Some(&format!("Bearer {}", token))).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidToken(reason) if reason == "Token expired"));
    }

    #[test]
    fn test_just_expired_token_rejected() {
        let validator = validator();
        let now = unix_now().unwrap();
        let token = validator
            .sign(&Claims {
                sub: "alice".into(),
                iat: now - 3630,
                exp: now - 30,
            })
            .unwrap();
        let gate = AuthGate::new(validator);

        let err = gate.verify(Some(&format!("Bearer {}", token))).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidToken(reason) if reason == "Token expired"));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let gate = AuthGate::new(validator());
        assert!(matches!(
            gate.verify(Some("Bearer not.a.jwt")),
            Err(GatewayError::InvalidToken(_))
        ));
    }
}
