//! Credential Service
//!
//! Registration and password login against the identity store.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Identity, Role};
use crate::error::{PlatformError, Result};
use crate::repository::IdentityRepository;
use crate::service::authorization::AuthContext;
use crate::service::password::PasswordService;

#[derive(Debug, Clone)]
pub struct RegisterCandidate {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password: String,
    pub courses: Vec<String>,
}

pub struct CredentialService {
    identities: Arc<dyn IdentityRepository>,
    passwords: Arc<PasswordService>,
}

impl CredentialService {
    pub fn new(identities: Arc<dyn IdentityRepository>, passwords: Arc<PasswordService>) -> Self {
        Self { identities, passwords }
    }

    /// Register a new identity.
    ///
    /// Students may self-register. Any other role can only be created by an
    /// authenticated registrar. Returns the new identity id.
    pub async fn register(
        &self,
        candidate: RegisterCandidate,
        actor: Option<&AuthContext>,
    ) -> Result<String> {
        if candidate.role != Role::Student {
            match actor {
                Some(ctx) if ctx.has_role(Role::Registrar) => {}
                Some(_) => {
                    return Err(PlatformError::forbidden(
                        "Only a registrar can register staff identities",
                    ))
                }
                None => {
                    return Err(PlatformError::unauthenticated(
                        "Staff registration requires a registrar token",
                    ))
                }
            }
        }

        let id = candidate.id.trim();
        if id.is_empty() {
            return Err(PlatformError::validation("Identity id is required"));
        }
        if id.contains('@') {
            return Err(PlatformError::validation("Identity id must not contain '@'"));
        }
        let email = candidate.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(PlatformError::validation("A valid email is required"));
        }
        self.passwords.validate(&candidate.password)?;

        let hash = self.passwords.hash_password(&candidate.password)?;
        let identity = Identity::new(id, email, candidate.role, hash)
            .with_name(candidate.first_name.trim(), candidate.last_name.trim())
            .with_courses(candidate.courses);

        self.identities.insert(&identity).await?;
        info!(identity_id = %identity.id, role = %identity.role, "Identity registered");

        Ok(identity.id)
    }

    /// Verify a password for an id or email.
    ///
    /// Unknown identifier and wrong password fail identically.
    pub async fn authenticate(&self, identifier: &str, plaintext: &str) -> Result<Identity> {
        let identifier = identifier.trim();
        let found = if identifier.contains('@') {
            self.identities.find_by_email(identifier).await?
        } else {
            self.identities.find_by_id(identifier).await?
        };

        match found {
            Some(identity) if self.passwords.verify_password(plaintext, &identity.password_hash) => {
                info!(identity_id = %identity.id, "Login succeeded");
                Ok(identity)
            }
            Some(identity) => {
                warn!(identity_id = %identity.id, "Login failed: wrong password");
                Err(PlatformError::AuthFailed)
            }
            None => {
                self.passwords.verify_dummy(plaintext);
                warn!("Login failed: unknown identifier");
                Err(PlatformError::AuthFailed)
            }
        }
    }
}
