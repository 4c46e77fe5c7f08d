//! Repository Layer
//!
//! Storage seams for the platform. Each entity has a trait describing the
//! operations the services need, a MongoDB implementation and an in-memory
//! implementation used by tests and local runs without a database.

pub mod complaint;
pub mod course;
pub mod identity;
pub mod indexes;
pub mod memory;

use async_trait::async_trait;

use crate::domain::{Complaint, ComplaintStatus, Course, Identity, Role, StatusUpdate};
use crate::error::Result;

pub use complaint::MongoComplaintRepository;
pub use course::MongoCourseRepository;
pub use identity::MongoIdentityRepository;
pub use indexes::ensure_indexes;
pub use memory::{MemoryComplaintRepository, MemoryCourseRepository, MemoryIdentityRepository};

/// MongoDB duplicate key error code
pub(crate) const DUPLICATE_KEY: i32 = 11000;

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Insert a new complaint.
    ///
    /// Fails with `DuplicateRequest` when an open complaint already exists
    /// for the same student and course. The check is atomic with the insert.
    async fn insert(&self, complaint: &Complaint) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Complaint>>;

    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Complaint>>;

    async fn find_by_responding_lecturer(&self, staff_id: &str) -> Result<Vec<Complaint>>;

    async fn find_by_course(&self, course_code: &str) -> Result<Vec<Complaint>>;

    async fn find_by_status(&self, status: ComplaintStatus) -> Result<Vec<Complaint>>;

    /// Apply `update` only if the complaint is still in `expected` status.
    ///
    /// Returns `true` when the update was applied, `false` when no complaint
    /// with that id and status exists.
    async fn update_status(
        &self,
        id: &str,
        expected: ComplaintStatus,
        update: &StatusUpdate,
    ) -> Result<bool>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Course>>;

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Course>>;

    async fn insert(&self, course: &Course) -> Result<()>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity. Fails with `AlreadyExists` when the id or the
    /// email is already registered.
    async fn insert(&self, identity: &Identity) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<Identity>>;
}

/// Whether a Mongo error is a unique index violation.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
