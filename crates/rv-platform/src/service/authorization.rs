//! Authorization Service
//!
//! Turns a bearer credential into an [`AuthContext`] and provides the role
//! checks used by the lifecycle engine and the HTTP layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Identity, Role};
use crate::error::{PlatformError, Result};
use crate::repository::IdentityRepository;
use crate::service::token::TokenService;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity_id: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn from_identity(identity: &Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity_id: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            expires_at,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(PlatformError::forbidden(format!("Requires role {}", role)))
        }
    }

    pub fn require_staff(&self) -> Result<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Requires a staff role"))
        }
    }

    /// Students may only read their own records
    pub fn can_view_student(&self, student_id: &str) -> bool {
        self.is_staff() || self.identity_id == student_id
    }
}

/// Accepts `Bearer <token>` or the raw token.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        // A scheme with nothing after it
        None if header.eq_ignore_ascii_case("bearer") => return None,
        None => header,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Verifies bearer tokens and resolves the subject to a live identity.
pub struct AccessGate {
    tokens: Arc<TokenService>,
    identities: Arc<dyn IdentityRepository>,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenService>, identities: Arc<dyn IdentityRepository>) -> Self {
        Self { tokens, identities }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext> {
        let header = authorization
            .ok_or_else(|| PlatformError::unauthenticated("Missing Authorization header"))?;
        let token = extract_bearer_token(header)
            .ok_or_else(|| PlatformError::unauthenticated("Invalid Authorization header format"))?;

        let claims = self.tokens.verify(token)?;

        // Older tokens carried the email as subject
        let identity = if claims.sub.contains('@') {
            self.identities.find_by_email(&claims.sub).await?
        } else {
            self.identities.find_by_id(&claims.sub).await?
        };
        let identity = identity
            .ok_or_else(|| PlatformError::unauthenticated("Token subject no longer exists"))?;

        Ok(AuthContext::from_identity(&identity, claims.expires_at()))
    }
}
