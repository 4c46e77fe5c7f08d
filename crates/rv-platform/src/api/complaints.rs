//! Complaints API
//!
//! Submission, approval chain moves and complaint queries.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::api::middleware::Authenticated;
use crate::domain::{Complaint, ComplaintStatus, Role, StatusChange};
use crate::error::PlatformError;
use crate::service::{
    AdvanceComplaint, ComplaintService, EvidenceStore, NotificationReport, SubmitComplaint,
};

/// Status history entry
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    pub actor_id: String,
    pub actor_role: Role,
    pub at: DateTime<Utc>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(c: StatusChange) -> Self {
        Self {
            from: c.from,
            to: c.to,
            actor_id: c.actor_id,
            actor_role: c.actor_role,
            at: c.at,
        }
    }
}

/// Complaint response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    pub requesting_student: String,
    pub course_concerned: String,
    pub request_details: String,
    pub test_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_evidence: Option<String>,
    pub responding_lecturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_reason: Option<String>,
    pub status: ComplaintStatus,
    pub history: Vec<StatusChangeResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Complaint> for ComplaintResponse {
    fn from(c: Complaint) -> Self {
        Self {
            id: c.id,
            requesting_student: c.requesting_student,
            course_concerned: c.course_concerned,
            request_details: c.request_details,
            test_score: c.test_score,
            student_evidence: c.student_evidence,
            responding_lecturer: c.responding_lecturer,
            lecturer_evidence: c.lecturer_evidence,
            lecturer_reason: c.lecturer_reason,
            status: c.status,
            history: c.history.into_iter().map(Into::into).collect(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Result of a submission or a status change
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintOutcomeResponse {
    pub complaint: ComplaintResponse,
    pub notifications: NotificationReport,
}

/// Optional body of the advance routes
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvanceRequest {
    /// Status the caller last saw. A mismatch is rejected with 409.
    #[serde(default)]
    pub expected_status: Option<ComplaintStatus>,
}

/// Multipart form for `POST /complaint`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct SubmitComplaintForm {
    course_concerned: String,
    request_details: String,
    test_score: u32,
    #[schema(value_type = String)]
    file: Vec<u8>,
}

/// Multipart form for `PUT /approved-by-lecturer/{id}`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct LecturerApprovalForm {
    reason: String,
    #[schema(value_type = Option<String>)]
    file: Option<Vec<u8>>,
    expected_status: Option<ComplaintStatus>,
}

#[derive(Clone)]
pub struct ComplaintsState {
    pub complaints: Arc<ComplaintService>,
    pub evidence: Arc<dyn EvidenceStore>,
}

struct Upload {
    file_name: String,
    content: Bytes,
}

/// Text fields and at most one file, keyed by field name
#[derive(Default)]
struct FormFields {
    text: Vec<(String, String)>,
    file: Option<Upload>,
}

impl FormFields {
    fn get(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, name: &str) -> Result<&str, PlatformError> {
        self.get(name)
            .ok_or_else(|| PlatformError::validation(format!("{} is required", name)))
    }
}

fn multipart_error(e: MultipartError) -> PlatformError {
    PlatformError::validation(format!("Invalid multipart body: {}", e.body_text()))
}

async fn read_form(mut multipart: Multipart) -> Result<FormFields, PlatformError> {
    let mut form = FormFields::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("evidence").to_string();
            let content = field.bytes().await.map_err(multipart_error)?;
            if !content.is_empty() {
                form.file = Some(Upload { file_name, content });
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.text.push((name, value));
        }
    }
    Ok(form)
}

fn parse_status(value: Option<&str>) -> Result<Option<ComplaintStatus>, PlatformError> {
    value
        .map(|v| v.parse::<ComplaintStatus>().map_err(PlatformError::validation))
        .transpose()
}

/// Drop evidence whose complaint write was rejected
async fn discard_evidence(state: &ComplaintsState, path: &str) {
    if let Err(e) = state.evidence.remove(path).await {
        warn!(file = %path, error = %e, "Failed to remove unreferenced evidence");
    }
}

/// Submit a revalidation request
#[utoipa::path(
    post,
    path = "/complaint",
    tag = "complaints",
    request_body(content = SubmitComplaintForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Complaint submitted", body = ComplaintOutcomeResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Open complaint exists or no eligible lecturer")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_complaint(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ComplaintOutcomeResponse>), PlatformError> {
    auth.0.require_role(Role::Student)?;

    let form = read_form(multipart).await?;
    let course_code = form.require("course_concerned")?.to_string();
    let request_details = form.require("request_details")?.to_string();
    let test_score = form
        .require("test_score")?
        .parse::<u32>()
        .map_err(|_| PlatformError::validation("test_score must be a non-negative integer"))?;
    let upload = form
        .file
        .ok_or_else(|| PlatformError::validation("file is required"))?;

    let evidence = state.evidence.store(&upload.file_name, upload.content).await?;
    let submitted = state
        .complaints
        .submit(
            &auth.0,
            SubmitComplaint {
                course_code,
                request_details,
                test_score,
                evidence: Some(evidence.clone()),
            },
        )
        .await;
    let outcome = match submitted {
        Ok(outcome) => outcome,
        Err(e) => {
            discard_evidence(&state, &evidence).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ComplaintOutcomeResponse {
            complaint: outcome.complaint.into(),
            notifications: outcome.notifications,
        }),
    ))
}

/// Get a complaint by id
#[utoipa::path(
    get,
    path = "/complaint/{id}",
    tag = "complaints",
    params(("id" = String, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint found", body = ComplaintResponse),
        (status = 404, description = "Complaint not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_complaint(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ComplaintResponse>, PlatformError> {
    let complaint = state.complaints.get(&auth.0, &id).await?;
    Ok(Json(complaint.into()))
}

fn to_responses(complaints: Vec<Complaint>) -> Json<Vec<ComplaintResponse>> {
    Json(complaints.into_iter().map(Into::into).collect())
}

/// Query of `GET /complaints/{id}`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentComplaintsQuery {
    /// Only complaints concerning this course code
    pub course: Option<String>,
}

/// List complaints raised by a student
#[utoipa::path(
    get,
    path = "/complaints/{id}",
    tag = "complaints",
    params(("id" = String, Path, description = "Student matric number"), StudentComplaintsQuery),
    responses(
        (status = 200, description = "Complaints of the student", body = Vec<ComplaintResponse>),
        (status = 403, description = "Students may only list their own complaints")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_student_complaints(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Query(query): Query<StudentComplaintsQuery>,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    let mut complaints = state.complaints.list_for_student(&auth.0, &id).await?;
    if let Some(course) = query.course.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        complaints.retain(|c| c.course_concerned.eq_ignore_ascii_case(course));
    }
    Ok(to_responses(complaints))
}

/// List complaints assigned to a lecturer
#[utoipa::path(
    get,
    path = "/staff-complaints/{id}",
    tag = "complaints",
    params(("id" = String, Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Complaints assigned to the lecturer", body = Vec<ComplaintResponse>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_staff_complaints(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    Ok(to_responses(state.complaints.list_for_lecturer(&auth.0, &id).await?))
}

/// List complaints for a course
#[utoipa::path(
    get,
    path = "/course-complaints/{code}",
    tag = "complaints",
    params(("code" = String, Path, description = "Course code")),
    responses(
        (status = 200, description = "Complaints for the course", body = Vec<ComplaintResponse>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_course_complaints(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(code): Path<String>,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    Ok(to_responses(state.complaints.list_for_course(&auth.0, &code).await?))
}

/// Complaints waiting on course advisor review
#[utoipa::path(
    get,
    path = "/advisor-complaints",
    tag = "review-queues",
    responses((status = 200, description = "Complaints approved by a lecturer", body = Vec<ComplaintResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn advisor_queue(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    Ok(to_responses(state.complaints.review_queue(&auth.0, Role::CourseAdvisor).await?))
}

/// Complaints waiting on head of department review
#[utoipa::path(
    get,
    path = "/hod-complaints",
    tag = "review-queues",
    responses((status = 200, description = "Complaints approved by a course advisor", body = Vec<ComplaintResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn hod_queue(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    Ok(to_responses(state.complaints.review_queue(&auth.0, Role::HeadOfDepartment).await?))
}

/// Complaints waiting on senate review
#[utoipa::path(
    get,
    path = "/senate-complaints",
    tag = "review-queues",
    responses((status = 200, description = "Complaints approved by a head of department", body = Vec<ComplaintResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn senate_queue(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ComplaintResponse>>, PlatformError> {
    Ok(to_responses(state.complaints.review_queue(&auth.0, Role::Senate).await?))
}

async fn advance(
    state: &ComplaintsState,
    auth: &Authenticated,
    cmd: AdvanceComplaint,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let outcome = state.complaints.advance(&auth.0, cmd).await?;
    Ok(Json(ComplaintOutcomeResponse {
        complaint: outcome.complaint.into(),
        notifications: outcome.notifications,
    }))
}

/// Lecturer approval, with a reason and optional evidence
#[utoipa::path(
    put,
    path = "/approved-by-lecturer/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Complaint ID")),
    request_body(content = LecturerApprovalForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Complaint approved by lecturer", body = ComplaintOutcomeResponse),
        (status = 400, description = "Reason missing"),
        (status = 403, description = "Caller is not the responding lecturer"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Illegal or stale transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_by_lecturer(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let form = read_form(multipart).await?;

    let mut cmd = AdvanceComplaint::new(id, ComplaintStatus::ApprovedByLecturer);
    cmd.reason = form.get("reason").map(str::to_string);
    cmd.expected_status = parse_status(form.get("expected_status"))?;

    // Store evidence only once the caller is allowed to act
    if let Some(upload) = form.file {
        let complaint = state.complaints.get(&auth.0, &cmd.complaint_id).await?;
        if auth.0.identity_id != complaint.responding_lecturer {
            return Err(PlatformError::forbidden(
                "Only the responding lecturer may act on this complaint",
            ));
        }
        cmd.evidence = Some(state.evidence.store(&upload.file_name, upload.content).await?);
    }

    let evidence = cmd.evidence.clone();
    let result = advance(&state, &auth, cmd).await;
    if let (Err(_), Some(path)) = (&result, evidence) {
        discard_evidence(&state, &path).await;
    }
    result
}

/// An empty body carries no expectation; any other body must be a valid
/// `AdvanceRequest`.
fn command(id: String, target: ComplaintStatus, body: &[u8]) -> Result<AdvanceComplaint, PlatformError> {
    let mut cmd = AdvanceComplaint::new(id, target);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(cmd);
    }
    let request: AdvanceRequest = serde_json::from_slice(body)
        .map_err(|e| PlatformError::validation(format!("Invalid request body: {}", e)))?;
    cmd.expected_status = request.expected_status;
    Ok(cmd)
}

/// Course advisor approval
#[utoipa::path(
    put,
    path = "/approved-by-advisor/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Complaint ID")),
    request_body(content = AdvanceRequest, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Complaint approved by course advisor", body = ComplaintOutcomeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 403, description = "Caller does not review this stage"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Illegal or stale transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_by_advisor(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let cmd = command(id, ComplaintStatus::ApprovedByCourseAdvisor, &body)?;
    advance(&state, &auth, cmd).await
}

/// Head of department approval
#[utoipa::path(
    put,
    path = "/approved-by-hod/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Complaint ID")),
    request_body(content = AdvanceRequest, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Complaint approved by head of department", body = ComplaintOutcomeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 403, description = "Caller does not review this stage"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Illegal or stale transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_by_hod(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let cmd = command(id, ComplaintStatus::ApprovedByHod, &body)?;
    advance(&state, &auth, cmd).await
}

/// Senate approval
#[utoipa::path(
    put,
    path = "/approved-by-senate/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Complaint ID")),
    request_body(content = AdvanceRequest, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Complaint approved by senate", body = ComplaintOutcomeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 403, description = "Caller does not review this stage"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Illegal or stale transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_by_senate(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let cmd = command(id, ComplaintStatus::ApprovedBySenate, &body)?;
    advance(&state, &auth, cmd).await
}

/// Decline a complaint at its current stage
#[utoipa::path(
    put,
    path = "/decline/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Complaint ID")),
    request_body(content = AdvanceRequest, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Complaint declined", body = ComplaintOutcomeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 403, description = "Caller does not review this stage"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Illegal or stale transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn decline_complaint(
    State(state): State<ComplaintsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ComplaintOutcomeResponse>, PlatformError> {
    let cmd = command(id, ComplaintStatus::Declined, &body)?;
    advance(&state, &auth, cmd).await
}

pub fn complaints_router(state: ComplaintsState) -> Router {
    Router::new()
        .route("/complaint", post(submit_complaint))
        .route("/complaint/:id", get(get_complaint))
        .route("/complaints/:id", get(list_student_complaints))
        .route("/staff-complaints/:id", get(list_staff_complaints))
        .route("/course-complaints/:code", get(list_course_complaints))
        .route("/advisor-complaints", get(advisor_queue))
        .route("/hod-complaints", get(hod_queue))
        .route("/senate-complaints", get(senate_queue))
        .route("/approved-by-lecturer/:id", put(approve_by_lecturer))
        .route("/approved-by-advisor/:id", put(approve_by_advisor))
        .route("/approved-by-hod/:id", put(approve_by_hod))
        .route("/approved-by-senate/:id", put(approve_by_senate))
        .route("/decline/:id", put(decline_complaint))
        .with_state(state)
}
