//! Complaint lifecycle engine
//!
//! Owns every state change of a complaint: submission, movement along the
//! approval chain, and the reads each role is allowed to make.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{Complaint, ComplaintStatus, Role, StatusChange, StatusUpdate, Stage, APPROVAL_CHAIN};
use crate::error::{PlatformError, Result};
use crate::repository::{ComplaintRepository, CourseRepository};
use crate::service::assignment::AssignmentPolicy;
use crate::service::authorization::AuthContext;
use crate::service::notification::{LifecycleEvent, NotificationReport, NotificationService};

#[derive(Debug, Clone)]
pub struct SubmitComplaint {
    pub course_code: String,
    pub request_details: String,
    pub test_score: u32,
    /// Public path of an already stored evidence file
    pub evidence: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdvanceComplaint {
    pub complaint_id: String,
    pub target: ComplaintStatus,
    /// Lecturer stage only
    pub evidence: Option<String>,
    /// Lecturer stage only, required there
    pub reason: Option<String>,
    /// When set, the move fails with `StaleState` unless the complaint is
    /// still in this status
    pub expected_status: Option<ComplaintStatus>,
}

impl AdvanceComplaint {
    pub fn new(complaint_id: impl Into<String>, target: ComplaintStatus) -> Self {
        Self {
            complaint_id: complaint_id.into(),
            target,
            evidence: None,
            reason: None,
            expected_status: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_evidence(mut self, path: impl Into<String>) -> Self {
        self.evidence = Some(path.into());
        self
    }

    pub fn expecting(mut self, status: ComplaintStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub complaint: Complaint,
    pub notifications: NotificationReport,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub complaint: Complaint,
    pub notifications: NotificationReport,
}

pub struct ComplaintService {
    complaints: Arc<dyn ComplaintRepository>,
    courses: Arc<dyn CourseRepository>,
    assignment: Arc<dyn AssignmentPolicy>,
    notifications: Arc<NotificationService>,
}

impl ComplaintService {
    pub fn new(
        complaints: Arc<dyn ComplaintRepository>,
        courses: Arc<dyn CourseRepository>,
        assignment: Arc<dyn AssignmentPolicy>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            complaints,
            courses,
            assignment,
            notifications,
        }
    }

    /// Create a pending complaint for the calling student and notify the
    /// assigned lecturer.
    pub async fn submit(&self, actor: &AuthContext, cmd: SubmitComplaint) -> Result<SubmitOutcome> {
        actor.require_role(Role::Student)?;

        let course_code = cmd.course_code.trim();
        if course_code.is_empty() {
            return Err(PlatformError::validation("course_concerned is required"));
        }
        let details = cmd.request_details.trim();
        if details.is_empty() {
            return Err(PlatformError::validation("request_details is required"));
        }

        let course = self
            .courses
            .find_by_code(course_code)
            .await?
            .ok_or_else(|| PlatformError::CourseNotFound { code: course_code.to_string() })?;

        let lecturer = self
            .assignment
            .choose(&course.code, &course.eligible_lecturers())
            .ok_or_else(|| PlatformError::NoEligibleLecturer { code: course.code.clone() })?;

        let mut complaint = Complaint::new(&actor.identity_id, &course.code, details, cmd.test_score, lecturer);
        if let Some(evidence) = cmd.evidence {
            complaint = complaint.with_student_evidence(evidence);
        }

        self.complaints.insert(&complaint).await?;
        info!(
            complaint_id = %complaint.id,
            student = %complaint.requesting_student,
            course = %complaint.course_concerned,
            lecturer = %complaint.responding_lecturer,
            policy = self.assignment.name(),
            "Complaint submitted"
        );

        let notifications = self.notifications.dispatch(&complaint, LifecycleEvent::Submitted).await;
        Ok(SubmitOutcome { complaint, notifications })
    }

    /// Move a complaint one step along the chain, or decline it.
    pub async fn advance(&self, actor: &AuthContext, cmd: AdvanceComplaint) -> Result<TransitionOutcome> {
        let complaint = self.load(&cmd.complaint_id).await?;
        let from = complaint.status;

        if let Some(expected) = cmd.expected_status {
            if expected != from {
                return Err(PlatformError::StaleState { id: complaint.id, expected });
            }
        }

        let stage = from
            .transition_to(cmd.target)
            .ok_or(PlatformError::IllegalTransition { from, to: cmd.target })?;
        authorize_reviewer(actor, stage, &complaint)?;

        let lecturer_approval = cmd.target == ComplaintStatus::ApprovedByLecturer;
        let reason = cmd.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        if lecturer_approval && reason.is_none() {
            return Err(PlatformError::validation("A reason is required to approve as lecturer"));
        }

        let update = StatusUpdate {
            change: StatusChange {
                from,
                to: cmd.target,
                actor_id: actor.identity_id.clone(),
                actor_role: actor.role,
                at: Utc::now(),
            },
            lecturer_evidence: if lecturer_approval { cmd.evidence.clone() } else { None },
            lecturer_reason: if lecturer_approval { reason.map(str::to_string) } else { None },
        };

        if !self.complaints.update_status(&complaint.id, from, &update).await? {
            warn!(complaint_id = %complaint.id, expected = %from, "Complaint changed before update was applied");
            return Err(PlatformError::StaleState { id: complaint.id, expected: from });
        }

        let mut complaint = complaint;
        complaint.apply(&update);
        info!(
            complaint_id = %complaint.id,
            from = %from,
            to = %cmd.target,
            actor = %actor.identity_id,
            "Complaint status changed"
        );

        let notifications = self
            .notifications
            .dispatch(&complaint, LifecycleEvent::Transitioned { from, to: cmd.target })
            .await;
        Ok(TransitionOutcome { complaint, notifications })
    }

    pub async fn get(&self, actor: &AuthContext, id: &str) -> Result<Complaint> {
        let complaint = self.load(id).await?;
        if !actor.can_view_student(&complaint.requesting_student) {
            // Not revealing that someone else's complaint exists
            return Err(PlatformError::not_found("Complaint", id));
        }
        Ok(complaint)
    }

    pub async fn list_for_student(&self, actor: &AuthContext, student_id: &str) -> Result<Vec<Complaint>> {
        if !actor.can_view_student(student_id) {
            return Err(PlatformError::forbidden("Students may only list their own complaints"));
        }
        self.complaints.find_by_student(student_id).await
    }

    pub async fn list_for_lecturer(&self, actor: &AuthContext, staff_id: &str) -> Result<Vec<Complaint>> {
        actor.require_staff()?;
        self.complaints.find_by_responding_lecturer(staff_id).await
    }

    pub async fn list_for_course(&self, actor: &AuthContext, course_code: &str) -> Result<Vec<Complaint>> {
        actor.require_staff()?;
        self.complaints.find_by_course(course_code).await
    }

    pub async fn list_by_status(&self, actor: &AuthContext, status: ComplaintStatus) -> Result<Vec<Complaint>> {
        actor.require_staff()?;
        self.complaints.find_by_status(status).await
    }

    /// Complaints waiting on the given reviewer role.
    pub async fn review_queue(&self, actor: &AuthContext, reviewer: Role) -> Result<Vec<Complaint>> {
        let stage = APPROVAL_CHAIN
            .iter()
            .find(|stage| stage.reviewer == reviewer)
            .ok_or_else(|| PlatformError::validation(format!("{} has no review queue", reviewer)))?;
        self.list_by_status(actor, stage.from).await
    }

    async fn load(&self, id: &str) -> Result<Complaint> {
        self.complaints
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Complaint", id))
    }
}

fn authorize_reviewer(actor: &AuthContext, stage: &Stage, complaint: &Complaint) -> Result<()> {
    if actor.role != stage.reviewer {
        return Err(PlatformError::forbidden(format!(
            "Only a {} may act on a complaint in status {}",
            stage.reviewer, stage.from
        )));
    }
    if stage.reviewer == Role::Lecturer && actor.identity_id != complaint.responding_lecturer {
        return Err(PlatformError::forbidden("Only the responding lecturer may act on this complaint"));
    }
    Ok(())
}
