//! Session bearer tokens
//!
//! Stateless HS256 tokens whose subject claim is the session id. Validity
//! is purely cryptographic and time-based; the session store is never
//! consulted here.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenService {
    /// Creates a token service from the shared secret and the token
    /// lifetime in seconds. The lifetime must equal the session TTL so an
    /// expired session never carries a still-valid token.
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds: ttl_seconds as i64,
        }
    }

    /// Issues a signed token for the given session id.
    pub fn issue(&self, session_id: &str) -> Result<String> {
        self.issue_at(session_id, Utc::now().timestamp())
    }

    fn issue_at(&self, session_id: &str, issued_at: i64) -> Result<String> {
        let claims = SessionClaims {
            sub: session_id.to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to encode token: {}", e)))
    }

    /// Verifies a token and returns the session id it was issued for.
    ///
    /// Fails with `Unauthenticated` on a bad signature, an expired token,
    /// or a subject that is not a session id.
    pub fn verify(&self, token: &str) -> Result<String> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| ApiError::Unauthenticated)?
            .claims;

        // The subject must be one of our UUIDs, not arbitrary text.
        Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthenticated)?;

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    const TEST_SECRET: &str = "tasks-api-test-secret";
    const TEST_TTL: u64 = 3600;

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET, TEST_TTL)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let service = service();
        let session_id = Uuid::new_v4().to_string();

        let token = service.issue(&session_id).unwrap();
        let verified = service.verify(&token).unwrap();

        assert_eq!(verified, session_id);
    }

    #[test]
    fn test_rejects_tampered_token() {
        let service = service();
        let token = service.issue(&Uuid::new_v4().to_string()).unwrap();
        let tampered = format!("{}x", token);

        assert!(matches!(
            service.verify(&tampered),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let service = service();
        let other = TokenService::new("a-completely-different-secret", TEST_TTL);
        let token = other.issue(&Uuid::new_v4().to_string()).unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = service();
        // Issued far enough in the past that exp is behind now even after
        // the default validation leeway.
        let issued_at = Utc::now().timestamp() - TEST_TTL as i64 - 120;
        let token = service
            .issue_at(&Uuid::new_v4().to_string(), issued_at)
            .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let service = service();
        let claims = SessionClaims {
            sub: "not-a-session-id".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(ApiError::Unauthenticated)
        ));
    }
}
