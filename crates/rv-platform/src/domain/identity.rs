//! Identity Entity
//!
//! A principal of the institution: a student or a member of staff holding
//! one of the reviewer roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

/// Role held by an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Lecturer,
    CourseAdvisor,
    HeadOfDepartment,
    Senate,
    Registrar,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::CourseAdvisor => "course_advisor",
            Role::HeadOfDepartment => "head_of_department",
            Role::Senate => "senate",
            Role::Registrar => "registrar",
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "lecturer" => Ok(Role::Lecturer),
            "course_advisor" => Ok(Role::CourseAdvisor),
            "head_of_department" | "hod" => Ok(Role::HeadOfDepartment),
            "senate" => Ok(Role::Senate),
            "registrar" => Ok(Role::Registrar),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Stored identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Matric number or staff id
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    pub role: Role,

    /// Argon2id PHC string. Never leaves the storage layer in a response.
    pub password_hash: String,

    /// Courses enrolled in (students) or taught (lecturers)
    #[serde(default)]
    pub courses: Vec<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into().trim().to_lowercase(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            password_hash: password_hash.into(),
            courses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_courses(mut self, courses: Vec<String>) -> Self {
        self.courses = courses;
        self
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.id.clone()
        } else {
            name.to_string()
        }
    }
}
