//! API Layer
//!
//! REST API endpoints for the platform and the wiring that assembles them
//! into one router.

pub mod common;
pub mod middleware;

pub mod auth;
pub mod complaints;
pub mod courses;
pub mod openapi;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Json, Router};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::PlatformConfig;
use crate::repository::{ComplaintRepository, CourseRepository, IdentityRepository};
use crate::service::{
    policy_for, AccessGate, ComplaintService, CredentialService, EvidenceStore,
    LocalEvidenceStore, Mailer, NotificationService, PasswordService, TokenService,
};

pub use common::*;
pub use middleware::{Authenticated, OptionalAuth};
pub use auth::{AuthState, auth_router};
pub use complaints::{ComplaintsState, complaints_router};
pub use courses::{CoursesState, courses_router};
pub use openapi::PlatformApiDoc;

/// Upper bound on a request body, evidence uploads included
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "monitoring",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Every service the HTTP layer needs, built from one configuration
#[derive(Clone)]
pub struct PlatformServices {
    pub gate: Arc<AccessGate>,
    pub auth: AuthState,
    pub complaints: ComplaintsState,
    pub courses: CoursesState,
    pub uploads_dir: PathBuf,
}

impl PlatformServices {
    pub fn new(
        config: &PlatformConfig,
        complaint_repo: Arc<dyn ComplaintRepository>,
        course_repo: Arc<dyn CourseRepository>,
        identity_repo: Arc<dyn IdentityRepository>,
        mailer: Arc<dyn Mailer>,
        passwords: Arc<PasswordService>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.token_expiry));
        let gate = Arc::new(AccessGate::new(tokens.clone(), identity_repo.clone()));
        let credentials = Arc::new(CredentialService::new(identity_repo.clone(), passwords));

        let notifications = Arc::new(NotificationService::new(mailer, identity_repo.clone(), &config.mail));
        let complaint_service = Arc::new(ComplaintService::new(
            complaint_repo,
            course_repo.clone(),
            policy_for(config.assignment_policy),
            notifications,
        ));
        let evidence: Arc<dyn EvidenceStore> = Arc::new(LocalEvidenceStore::new(&config.uploads_dir));

        Self {
            gate,
            auth: AuthState { credentials, tokens },
            complaints: ComplaintsState { complaints: complaint_service, evidence },
            courses: CoursesState { identities: identity_repo, courses: course_repo },
            uploads_dir: config.uploads_dir.clone(),
        }
    }

    /// The complete platform router
    pub fn router(self) -> Router {
        Router::new()
            .merge(auth_router(self.auth))
            .merge(complaints_router(self.complaints))
            .merge(courses_router(self.courses))
            .route("/health", get(health))
            .nest_service("/uploads", ServeDir::new(self.uploads_dir))
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", PlatformApiDoc::openapi()))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(Extension(self.gate))
    }
}
