//! Auth API Endpoints
//!
//! - POST /register - Register an identity (students self-register)
//! - POST /login - Password login by id or email

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::common::CreatedResponse;
use crate::api::middleware::OptionalAuth;
use crate::domain::Role;
use crate::error::PlatformError;
use crate::service::{CredentialService, RegisterCandidate, TokenService};

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Matric number for students, staff id otherwise
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// Defaults to `student`
    #[serde(default = "default_role")]
    pub role: Role,

    pub password: String,

    /// Course codes enrolled in or taught
    #[serde(default)]
    pub courses: Vec<String>,
}

fn default_role() -> Role {
    Role::Student
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Identity id or email
    pub identifier: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,

    pub user_id: String,

    pub role: Role,
}

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<CredentialService>,
    pub tokens: Arc<TokenService>,
}

/// Register an identity
///
/// Students may register themselves. Staff roles need a registrar token.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity registered", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Staff registration without a token"),
        (status = 403, description = "Caller is not a registrar"),
        (status = 409, description = "Id or email already registered")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    auth: OptionalAuth,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    let candidate = RegisterCandidate {
        id: req.id,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        role: req.role,
        password: req.password,
        courses: req.courses,
    };

    let id = state.credentials.register(candidate, auth.0.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

/// Login with id or email and password
///
/// The access token is returned in the body and in the `Authorization`
/// response header.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, PlatformError> {
    let identity = state.credentials.authenticate(&req.identifier, &req.password).await?;
    let issued = state.tokens.issue(&identity)?;

    let header = HeaderValue::from_str(&issued.token).map_err(|e| PlatformError::Internal {
        message: format!("Token is not a valid header value: {}", e),
    })?;

    let body = LoginResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiry().num_seconds(),
        user_id: identity.id,
        role: identity.role,
    };

    Ok(([(AUTHORIZATION, header)], Json(body)).into_response())
}

pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}
