//! Course Repository

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;

use super::CourseRepository;
use crate::domain::Course;
use crate::error::Result;

pub const COURSES_COLLECTION: &str = "courses";

pub struct MongoCourseRepository {
    collection: Collection<Course>,
}

impl MongoCourseRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COURSES_COLLECTION),
        }
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Course>> {
        Ok(self.collection.find_one(doc! { "_id": code }).await?)
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Course>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection
            .find(doc! { "_id": { "$in": codes } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, course: &Course) -> Result<()> {
        self.collection.insert_one(course).await?;
        Ok(())
    }
}
