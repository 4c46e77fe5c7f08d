//! Course Entity
//!
//! Reference data owned by the course catalog. The lifecycle engine only
//! reads it to find the lecturers eligible to respond for a course.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Course code, e.g. "CS101"
    #[serde(rename = "_id")]
    pub code: String,

    pub name: String,

    #[serde(default)]
    pub semester: String,

    /// Staff ids of lecturers who may respond to complaints for this course
    #[serde(default)]
    pub lecturers: Vec<String>,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            semester: String::new(),
            lecturers: Vec::new(),
        }
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }

    pub fn with_lecturer(mut self, staff_id: impl Into<String>) -> Self {
        self.lecturers.push(staff_id.into());
        self
    }

    /// Lecturer ids with duplicates and blanks removed, in first-seen order.
    pub fn eligible_lecturers(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.lecturers.len());
        for id in &self.lecturers {
            let id = id.trim();
            if !id.is_empty() && !seen.iter().any(|s: &String| s == id) {
                seen.push(id.to_string());
            }
        }
        seen
    }
}
