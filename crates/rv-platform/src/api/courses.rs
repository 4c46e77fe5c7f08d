//! Courses API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::middleware::Authenticated;
use crate::domain::Course;
use crate::error::PlatformError;
use crate::repository::{CourseRepository, IdentityRepository};

/// Course response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub code: String,
    pub name: String,
    pub semester: String,
    pub lecturers: Vec<String>,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            code: c.code,
            name: c.name,
            semester: c.semester,
            lecturers: c.lecturers,
        }
    }
}

#[derive(Clone)]
pub struct CoursesState {
    pub identities: Arc<dyn IdentityRepository>,
    pub courses: Arc<dyn CourseRepository>,
}

/// Courses an identity is enrolled in or teaches
#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = String, Path, description = "Identity ID")),
    responses(
        (status = 200, description = "Courses of the identity", body = Vec<CourseResponse>),
        (status = 403, description = "Students may only read their own courses"),
        (status = 404, description = "Identity not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_identity_courses(
    State(state): State<CoursesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<CourseResponse>>, PlatformError> {
    if !auth.0.can_view_student(&id) {
        return Err(PlatformError::forbidden("Students may only read their own courses"));
    }

    let identity = state
        .identities
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Identity", &id))?;

    let courses = state.courses.find_by_codes(&identity.courses).await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

pub fn courses_router(state: CoursesState) -> Router {
    Router::new()
        .route("/courses/:id", get(list_identity_courses))
        .with_state(state)
}
