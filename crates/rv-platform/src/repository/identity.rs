//! Identity Repository

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;

use super::{is_duplicate_key, IdentityRepository};
use crate::domain::{Identity, Role};
use crate::error::{PlatformError, Result};

pub const IDENTITIES_COLLECTION: &str = "identities";

pub struct MongoIdentityRepository {
    collection: Collection<Identity>,
}

impl MongoIdentityRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(IDENTITIES_COLLECTION),
        }
    }
}

#[async_trait]
impl IdentityRepository for MongoIdentityRepository {
    async fn insert(&self, identity: &Identity) -> Result<()> {
        // `_id` and the unique email index close the check-then-insert race
        match self.collection.insert_one(identity).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                let (field, value) = if e.to_string().contains("email") {
                    ("email", identity.email.clone())
                } else {
                    ("id", identity.id.clone())
                };
                Err(PlatformError::AlreadyExists {
                    field: field.to_string(),
                    value,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let email = email.trim().to_lowercase();
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let cursor = self.collection
            .find(doc! { "role": role.as_str() })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
