//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id, valid for 30 days. There is
//! no server-side session store: possession of a validly signed, unexpired
//! token IS the session.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use techshop_core::UserId;

use super::AuthError;

/// How long an issued token stays valid.
const TOKEN_TTL_DAYS: i64 = 30;

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id the token asserts.
    sub: i32,
    /// Issued-at, seconds since epoch.
    iat: i64,
    /// Expiry, seconds since epoch.
    exp: i64,
}

/// Signing and verification keys derived from the configured secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    /// Derive the key pair from the process-wide signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a 30-day token asserting `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_i32(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::TokenSigning)
    }

    /// Verify a token and extract the user id it asserts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, expired, or
    /// wrongly signed token.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(UserId::new(data.claims.sub))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("k9!mQ2@xV7#bN4$cR8%jW1&hT5*pL3^z"))
    }

    #[test]
    fn test_issue_then_verify_roundtrip() {
        let keys = keys();
        let token = keys.issue(UserId::new(42)).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(matches!(
            keys().verify("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let token = keys().issue(UserId::new(1)).unwrap();
        let other = TokenKeys::new(&SecretString::from("z3^Lp5*Th1&Wj8%Rc4$Nb7#Vx2@Qm9!k"));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }
}
