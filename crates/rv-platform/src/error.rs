//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::api::common::ApiError;
use crate::domain::ComplaintStatus;
use crate::service::mailer::MailError;
use crate::service::token::TokenError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Course not found: {code}")]
    CourseNotFound { code: String },

    #[error("No eligible lecturer registered for course {code}")]
    NoEligibleLecturer { code: String },

    #[error("An open complaint already exists for {student_id} on {course_code}")]
    DuplicateRequest { student_id: String, course_code: String },

    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition { from: ComplaintStatus, to: ComplaintStatus },

    #[error("Complaint {id} is no longer in status {expected}")]
    StaleState { id: String, expected: ComplaintStatus },

    #[error("Identity already exists: {field}={value}")]
    AlreadyExists { field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Stable machine-readable code returned in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::CourseNotFound { .. } => "COURSE_NOT_FOUND",
            Self::NoEligibleLecturer { .. } => "NO_ELIGIBLE_LECTURER",
            Self::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::StaleState { .. } => "STALE_STATE",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::AuthFailed | Self::Unauthenticated { .. } | Self::Token(_) => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Database(_)
            | Self::Serialization(_)
            | Self::Deserialization(_)
            | Self::Io(_)
            | Self::Mail(_)
            | Self::Configuration { .. }
            | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::CourseNotFound { .. } => StatusCode::NOT_FOUND,
            Self::NoEligibleLecturer { .. }
            | Self::DuplicateRequest { .. }
            | Self::IllegalTransition { .. }
            | Self::StaleState { .. }
            | Self::AlreadyExists { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::AuthFailed | Self::Unauthenticated { .. } | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to expose to the client.
    ///
    /// Auth failures collapse to one generic text, not-found never echoes the
    /// lookup key, and collaborator failures never leak their internals.
    pub fn public_message(&self) -> String {
        match self {
            Self::AuthFailed => "Invalid credentials".to_string(),
            Self::Unauthenticated { .. } | Self::Token(_) => "Unauthorized".to_string(),
            Self::NotFound { entity_type, .. } => format!("{} not found", entity_type),
            Self::CourseNotFound { .. } => "Course not found".to_string(),
            Self::DuplicateRequest { .. } => {
                "You already have an open complaint for this course".to_string()
            }
            Self::StaleState { .. } => {
                "Complaint was changed by another request; reload and retry".to_string()
            }
            Self::NoEligibleLecturer { .. }
            | Self::IllegalTransition { .. }
            | Self::AlreadyExists { .. }
            | Self::Validation { .. }
            | Self::Forbidden { .. } => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ApiError {
            error: self.code().to_string(),
            message: self.public_message(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
