//! Complaint Entity
//!
//! A revalidation request raised by a student against a course result, and
//! the approval chain it travels along.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

use super::identity::Role;

/// Complaint status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    /// Submitted, waiting for the responding lecturer
    Pending,
    ApprovedByLecturer,
    ApprovedByCourseAdvisor,
    ApprovedByHod,
    /// Terminal success
    ApprovedBySenate,
    /// Terminal rejection, reachable from any non-terminal status
    Declined,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::Pending,
        ComplaintStatus::ApprovedByLecturer,
        ComplaintStatus::ApprovedByCourseAdvisor,
        ComplaintStatus::ApprovedByHod,
        ComplaintStatus::ApprovedBySenate,
        ComplaintStatus::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "PENDING",
            ComplaintStatus::ApprovedByLecturer => "APPROVED_BY_LECTURER",
            ComplaintStatus::ApprovedByCourseAdvisor => "APPROVED_BY_COURSE_ADVISOR",
            ComplaintStatus::ApprovedByHod => "APPROVED_BY_HOD",
            ComplaintStatus::ApprovedBySenate => "APPROVED_BY_SENATE",
            ComplaintStatus::Declined => "DECLINED",
        }
    }

    /// Human-readable label used in notification mail
    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::ApprovedByLecturer => "Approved by Lecturer",
            ComplaintStatus::ApprovedByCourseAdvisor => "Approved by Course Advisor",
            ComplaintStatus::ApprovedByHod => "Approved by Head of Department",
            ComplaintStatus::ApprovedBySenate => "Approved by Senate",
            ComplaintStatus::Declined => "Declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::ApprovedBySenate | ComplaintStatus::Declined)
    }

    /// The approval stage a complaint in this status is waiting on.
    pub fn stage(&self) -> Option<&'static Stage> {
        APPROVAL_CHAIN.iter().find(|stage| stage.from == *self)
    }

    /// The single legal forward status, if any.
    pub fn next(&self) -> Option<ComplaintStatus> {
        self.stage().map(|stage| stage.to)
    }

    /// Returns the stage governing `self -> to` when that move is legal:
    /// either the next status in the chain or `Declined`, and never out of a
    /// terminal status.
    pub fn transition_to(&self, to: ComplaintStatus) -> Option<&'static Stage> {
        let stage = self.stage()?;
        if to == stage.to || to == ComplaintStatus::Declined {
            Some(stage)
        } else {
            None
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Unknown complaint status: {}", s))
    }
}

/// One step of the approval chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    /// Role allowed to approve or decline at this stage
    pub reviewer: Role,
}

/// The fixed approval chain. Declining is allowed to the reviewer of
/// whichever stage the complaint is currently waiting on.
pub const APPROVAL_CHAIN: [Stage; 4] = [
    Stage {
        from: ComplaintStatus::Pending,
        to: ComplaintStatus::ApprovedByLecturer,
        reviewer: Role::Lecturer,
    },
    Stage {
        from: ComplaintStatus::ApprovedByLecturer,
        to: ComplaintStatus::ApprovedByCourseAdvisor,
        reviewer: Role::CourseAdvisor,
    },
    Stage {
        from: ComplaintStatus::ApprovedByCourseAdvisor,
        to: ComplaintStatus::ApprovedByHod,
        reviewer: Role::HeadOfDepartment,
    },
    Stage {
        from: ComplaintStatus::ApprovedByHod,
        to: ComplaintStatus::ApprovedBySenate,
        reviewer: Role::Senate,
    },
];

/// Entry of a complaint's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    pub actor_id: String,
    pub actor_role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub at: DateTime<Utc>,
}

/// Patch applied by a single conditional status update
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub change: StatusChange,
    /// Set only by the lecturer stage
    pub lecturer_evidence: Option<String>,
    /// Set only by the lecturer stage
    pub lecturer_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(rename = "_id")]
    pub id: String,

    /// Matric number of the requesting student
    pub requesting_student: String,

    pub course_concerned: String,

    pub request_details: String,

    /// Disputed test score
    pub test_score: u32,

    /// Public path of the student's evidence file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_evidence: Option<String>,

    /// Staff id of the lecturer assigned to respond
    pub responding_lecturer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_evidence: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_reason: Option<String>,

    pub status: ComplaintStatus,

    /// True while the status is non-terminal. Backs the uniqueness
    /// constraint on open complaints per (student, course).
    pub open: bool,

    #[serde(default)]
    pub history: Vec<StatusChange>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    pub fn new(
        requesting_student: impl Into<String>,
        course_concerned: impl Into<String>,
        request_details: impl Into<String>,
        test_score: u32,
        responding_lecturer: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            requesting_student: requesting_student.into(),
            course_concerned: course_concerned.into(),
            request_details: request_details.into(),
            test_score,
            student_evidence: None,
            responding_lecturer: responding_lecturer.into(),
            lecturer_evidence: None,
            lecturer_reason: None,
            status: ComplaintStatus::Pending,
            open: true,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_student_evidence(mut self, path: impl Into<String>) -> Self {
        self.student_evidence = Some(path.into());
        self
    }

    /// Apply a status update in place, mirroring what the stored update does.
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.status = update.change.to;
        self.open = !update.change.to.is_terminal();
        self.updated_at = update.change.at;
        if let Some(evidence) = &update.lecturer_evidence {
            self.lecturer_evidence = Some(evidence.clone());
        }
        if let Some(reason) = &update.lecturer_reason {
            self.lecturer_reason = Some(reason.clone());
        }
        self.history.push(update.change.clone());
    }
}
