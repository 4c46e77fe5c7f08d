//! OpenAPI Documentation

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Revalidation Platform OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Revalidation Platform API",
        version = "1.0.0",
        description = "Student result revalidation requests and their approval chain"
    ),
    servers(
        (url = "http://localhost:4000", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "complaints", description = "Revalidation requests"),
        (name = "review-queues", description = "Complaints waiting on a reviewer role"),
        (name = "approvals", description = "Approval chain moves"),
        (name = "courses", description = "Courses"),
        (name = "monitoring", description = "Health")
    ),
    paths(
        super::auth::register,
        super::auth::login,
        super::complaints::submit_complaint,
        super::complaints::get_complaint,
        super::complaints::list_student_complaints,
        super::complaints::list_staff_complaints,
        super::complaints::list_course_complaints,
        super::complaints::advisor_queue,
        super::complaints::hod_queue,
        super::complaints::senate_queue,
        super::complaints::approve_by_lecturer,
        super::complaints::approve_by_advisor,
        super::complaints::approve_by_hod,
        super::complaints::approve_by_senate,
        super::complaints::decline_complaint,
        super::courses::list_identity_courses,
        super::health,
    ),
    components(
        schemas(
            super::common::ApiError,
            super::common::CreatedResponse,
            super::common::HealthResponse,
            super::auth::RegisterRequest,
            super::auth::LoginRequest,
            super::auth::LoginResponse,
            super::complaints::ComplaintResponse,
            super::complaints::StatusChangeResponse,
            super::complaints::ComplaintOutcomeResponse,
            super::complaints::AdvanceRequest,
            super::complaints::SubmitComplaintForm,
            super::complaints::LecturerApprovalForm,
            super::courses::CourseResponse,
            crate::domain::Role,
            crate::domain::ComplaintStatus,
            crate::service::NotificationReport,
            crate::service::NotificationFailure,
            crate::service::FailureReason,
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct PlatformApiDoc;
