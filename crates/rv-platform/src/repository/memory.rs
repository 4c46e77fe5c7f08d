//! In-memory repositories
//!
//! Used by tests and by the server when started without a database. Each
//! store keeps its documents behind one mutex, so uniqueness checks happen
//! under the same lock as the write they guard.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ComplaintRepository, CourseRepository, IdentityRepository};
use crate::domain::{Complaint, ComplaintStatus, Course, Identity, Role, StatusUpdate};
use crate::error::{PlatformError, Result};

#[derive(Default)]
pub struct MemoryComplaintRepository {
    complaints: Mutex<Vec<Complaint>>,
}

impl MemoryComplaintRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter(&self, predicate: impl Fn(&Complaint) -> bool) -> Vec<Complaint> {
        let mut found: Vec<Complaint> = self.complaints
            .lock()
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl ComplaintRepository for MemoryComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> Result<()> {
        let mut complaints = self.complaints.lock();
        let duplicate = complaint.open
            && complaints.iter().any(|c| {
                c.open
                    && c.requesting_student == complaint.requesting_student
                    && c.course_concerned == complaint.course_concerned
            });
        if duplicate {
            return Err(PlatformError::DuplicateRequest {
                student_id: complaint.requesting_student.clone(),
                course_code: complaint.course_concerned.clone(),
            });
        }
        complaints.push(complaint.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Complaint>> {
        Ok(self.complaints.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Complaint>> {
        Ok(self.filter(|c| c.requesting_student == student_id))
    }

    async fn find_by_responding_lecturer(&self, staff_id: &str) -> Result<Vec<Complaint>> {
        Ok(self.filter(|c| c.responding_lecturer == staff_id))
    }

    async fn find_by_course(&self, course_code: &str) -> Result<Vec<Complaint>> {
        Ok(self.filter(|c| c.course_concerned == course_code))
    }

    async fn find_by_status(&self, status: ComplaintStatus) -> Result<Vec<Complaint>> {
        Ok(self.filter(|c| c.status == status))
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ComplaintStatus,
        update: &StatusUpdate,
    ) -> Result<bool> {
        let mut complaints = self.complaints.lock();
        match complaints.iter_mut().find(|c| c.id == id && c.status == expected) {
            Some(complaint) => {
                complaint.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryCourseRepository {
    courses: Mutex<HashMap<String, Course>>,
}

impl MemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.courses.lock();
            for course in courses {
                map.insert(course.code.clone(), course);
            }
        }
        repo
    }
}

#[async_trait]
impl CourseRepository for MemoryCourseRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Course>> {
        Ok(self.courses.lock().get(code).cloned())
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Course>> {
        let courses = self.courses.lock();
        Ok(codes.iter().filter_map(|code| courses.get(code).cloned()).collect())
    }

    async fn insert(&self, course: &Course) -> Result<()> {
        self.courses.lock().insert(course.code.clone(), course.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryIdentityRepository {
    identities: Mutex<HashMap<String, Identity>>,
}

impl MemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for MemoryIdentityRepository {
    async fn insert(&self, identity: &Identity) -> Result<()> {
        let mut identities = self.identities.lock();
        if identities.contains_key(&identity.id) {
            return Err(PlatformError::AlreadyExists {
                field: "id".to_string(),
                value: identity.id.clone(),
            });
        }
        if identities.values().any(|i| i.email == identity.email) {
            return Err(PlatformError::AlreadyExists {
                field: "email".to_string(),
                value: identity.email.clone(),
            });
        }
        identities.insert(identity.id.clone(), identity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self.identities.lock().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let email = email.trim().to_lowercase();
        Ok(self.identities.lock().values().find(|i| i.email == email).cloned())
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let mut found: Vec<Identity> = self.identities
            .lock()
            .values()
            .filter(|i| i.role == role)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
