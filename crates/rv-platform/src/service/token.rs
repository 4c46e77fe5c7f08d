//! Token Service
//!
//! Issues and verifies HS256 signed JWT access tokens. The algorithm is pinned:
//! a token whose header names any other algorithm is rejected before the
//! signature is checked.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SigningSecret;
use crate::domain::{Identity, Role};
use crate::error::{PlatformError, Result};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Identity id (matric number or staff id)
    pub sub: String,
    /// Email of the identity the token was issued to
    pub iss: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &SigningSecret, expiry: std::time::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: Duration::from_std(expiry).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken> {
        self.issue_with_expiry(identity, self.expiry)
    }

    pub fn issue_with_expiry(&self, identity: &Identity, expiry: Duration) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + expiry;
        let claims = AccessTokenClaims {
            sub: identity.id.clone(),
            iss: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::Internal {
                message: format!("Failed to sign token: {}", e),
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> std::result::Result<AccessTokenClaims, TokenError> {
        match header_algorithm(token) {
            Some(alg) if alg == "HS256" => {}
            Some(_) => return Err(TokenError::InvalidSignature),
            None => return Err(TokenError::Malformed),
        }

        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })
    }
}

/// Reads `alg` from the token header without trusting anything else in it.
fn header_algorithm(token: &str) -> Option<String> {
    let header = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(header.trim_end_matches('=')).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("alg")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(fill: u8) -> SigningSecret {
        SigningSecret::new(vec![fill; 32]).unwrap()
    }

    fn student() -> Identity {
        Identity::new("S1", "s1@uni.edu", Role::Student, "hash")
    }

    fn service() -> TokenService {
        TokenService::new(&secret(7), std::time::Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let issued = service.issue(&student()).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, "S1");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.iss, "s1@uni.edu");
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let issued = service.issue_with_expiry(&student(), Duration::minutes(-5)).unwrap();
        assert_eq!(service.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let other = TokenService::new(&secret(9), std::time::Duration::from_secs(3600));
        let issued = other.issue(&student()).unwrap();
        assert_eq!(service().verify(&issued.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let service = service();
        let issued = service.issue(&student()).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let forged_claims = serde_json::json!({
            "sub": "S1", "iss": "s1@uni.edu", "role": "registrar",
            "iat": Utc::now().timestamp(), "exp": Utc::now().timestamp() + 3600,
        });
        let forged_payload = URL_SAFE_NO_PAD.encode(forged_claims.to_string());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(service.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let key = secret(7);
        let claims = AccessTokenClaims {
            sub: "S1".to_string(),
            iss: "s1@uni.edu".to_string(),
            role: Role::Student,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().verify(&hs512), Err(TokenError::InvalidSignature));

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(&claims).unwrap());
        let unsigned = format!("{}.{}.", header, payload);
        assert_eq!(service().verify(&unsigned), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = service();
        assert_eq!(service.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }
}
