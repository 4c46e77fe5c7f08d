//! Development data seeding
//!
//! Creates a demo course and one identity per role so a fresh dev instance
//! can walk a complaint through the whole approval chain. Existing records
//! are left untouched.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Course, Identity, Role};
use crate::error::Result;
use crate::repository::{CourseRepository, IdentityRepository};
use crate::service::PasswordService;

/// Password of every seeded identity
pub const DEV_PASSWORD: &str = "revalidation-dev";

const DEV_IDENTITIES: [(&str, &str, &str, &str, Role); 6] = [
    ("STU001", "student@revalidation.local", "Demo", "Student", Role::Student),
    ("LEC001", "lecturer@revalidation.local", "Demo", "Lecturer", Role::Lecturer),
    ("ADV001", "advisor@revalidation.local", "Demo", "Advisor", Role::CourseAdvisor),
    ("HOD001", "hod@revalidation.local", "Demo", "Head", Role::HeadOfDepartment),
    ("SEN001", "senate@revalidation.local", "Demo", "Senate", Role::Senate),
    ("REG001", "registrar@revalidation.local", "Demo", "Registrar", Role::Registrar),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub courses_created: usize,
    pub identities_created: usize,
}

pub struct DevDataSeeder {
    courses: Arc<dyn CourseRepository>,
    identities: Arc<dyn IdentityRepository>,
    passwords: Arc<PasswordService>,
}

impl DevDataSeeder {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        identities: Arc<dyn IdentityRepository>,
        passwords: Arc<PasswordService>,
    ) -> Self {
        Self { courses, identities, passwords }
    }

    pub async fn seed(&self) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        let demo_course = Course::new("CS101", "Introduction to Computer Science")
            .with_semester("first")
            .with_lecturer("LEC001");
        if self.courses.find_by_code(&demo_course.code).await?.is_none() {
            self.courses.insert(&demo_course).await?;
            summary.courses_created += 1;
        }

        for (id, email, first, last, role) in DEV_IDENTITIES {
            if self.identities.find_by_id(id).await?.is_some() {
                continue;
            }
            let hash = self.passwords.hash_password(DEV_PASSWORD)?;
            let identity = Identity::new(id, email, role, hash)
                .with_name(first, last)
                .with_courses(vec![demo_course.code.clone()]);
            self.identities.insert(&identity).await?;
            summary.identities_created += 1;
        }

        if summary.identities_created > 0 {
            warn!("Seeded dev identities share a well-known password; never enable dev mode in production");
        }
        info!(
            courses = summary.courses_created,
            identities = summary.identities_created,
            "Dev data seeded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryCourseRepository, MemoryIdentityRepository};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let courses = Arc::new(MemoryCourseRepository::new());
        let identities = Arc::new(MemoryIdentityRepository::new());
        let seeder = DevDataSeeder::new(courses.clone(), identities.clone(), Arc::new(PasswordService::default()));

        let first = seeder.seed().await.unwrap();
        assert_eq!(first, SeedSummary { courses_created: 1, identities_created: 6 });

        let second = seeder.seed().await.unwrap();
        assert_eq!(second, SeedSummary::default());

        let course = courses.find_by_code("CS101").await.unwrap().unwrap();
        assert_eq!(course.eligible_lecturers(), vec!["LEC001"]);
        assert_eq!(identities.find_by_role(Role::Senate).await.unwrap().len(), 1);
    }
}
