//! API Middleware
//!
//! Bearer-token extractors for Axum. The [`AccessGate`] is installed as a
//! request extension by the platform router.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::PlatformError;
use crate::service::{AccessGate, AuthContext};

fn gate(parts: &Parts) -> Result<Arc<AccessGate>, PlatformError> {
    parts
        .extensions
        .get::<Arc<AccessGate>>()
        .cloned()
        .ok_or_else(|| PlatformError::Internal {
            message: "AccessGate extension not installed".to_string(),
        })
}

/// Extractor for authenticated requests
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let gate = gate(parts).map_err(IntoResponse::into_response)?;
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

        gate.authenticate(header)
            .await
            .map(Authenticated)
            .map_err(IntoResponse::into_response)
    }
}

/// Extractor for optionally authenticated requests.
///
/// A missing header yields `None`. A header that is present but invalid is
/// still rejected, so a bad registrar token is never mistaken for anonymous.
pub struct OptionalAuth(pub Option<AuthContext>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(h) if !h.trim().is_empty() => h,
            _ => return Ok(OptionalAuth(None)),
        };

        let gate = gate(parts).map_err(IntoResponse::into_response)?;
        gate.authenticate(Some(header))
            .await
            .map(|ctx| OptionalAuth(Some(ctx)))
            .map_err(IntoResponse::into_response)
    }
}
