//! Complaint Repository

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::{doc, Document}, options::FindOptions};
use futures::TryStreamExt;

use super::{is_duplicate_key, ComplaintRepository};
use crate::domain::{Complaint, ComplaintStatus, StatusUpdate};
use crate::error::{PlatformError, Result};

pub const COMPLAINTS_COLLECTION: &str = "complaints";

pub struct MongoComplaintRepository {
    collection: Collection<Complaint>,
}

impl MongoComplaintRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COMPLAINTS_COLLECTION),
        }
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<Complaint>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl ComplaintRepository for MongoComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> Result<()> {
        // The partial unique index on open complaints rejects duplicates
        match self.collection.insert_one(complaint).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PlatformError::DuplicateRequest {
                student_id: complaint.requesting_student.clone(),
                course_code: complaint.course_concerned.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Complaint>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Complaint>> {
        self.find_many(doc! { "requestingStudent": student_id }).await
    }

    async fn find_by_responding_lecturer(&self, staff_id: &str) -> Result<Vec<Complaint>> {
        self.find_many(doc! { "respondingLecturer": staff_id }).await
    }

    async fn find_by_course(&self, course_code: &str) -> Result<Vec<Complaint>> {
        self.find_many(doc! { "courseConcerned": course_code }).await
    }

    async fn find_by_status(&self, status: ComplaintStatus) -> Result<Vec<Complaint>> {
        self.find_many(doc! { "status": status.as_str() }).await
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ComplaintStatus,
        update: &StatusUpdate,
    ) -> Result<bool> {
        let to = update.change.to;
        let mut set = doc! {
            "status": to.as_str(),
            "open": !to.is_terminal(),
            "updatedAt": bson::DateTime::from_chrono(update.change.at),
        };
        if let Some(evidence) = &update.lecturer_evidence {
            set.insert("lecturerEvidence", evidence.as_str());
        }
        if let Some(reason) = &update.lecturer_reason {
            set.insert("lecturerReason", reason.as_str());
        }

        let change = bson::to_bson(&update.change)?;

        // Compare-and-set on the current status
        let result = self.collection
            .update_one(
                doc! { "_id": id, "status": expected.as_str() },
                doc! { "$set": set, "$push": { "history": change } },
            )
            .await?;

        Ok(result.matched_count == 1)
    }
}
