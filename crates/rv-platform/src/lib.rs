//! Revalidation Platform
//!
//! Core platform providing:
//! - Complaint (revalidation request) lifecycle along the approval chain
//! - Randomized responding-lecturer assignment
//! - Stateless bearer-token authentication and role gating
//! - Credential storage with Argon2id password hashes
//! - Mail notifications for lifecycle transitions

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod config;
pub mod error;
pub mod seed;

pub use domain::*;
pub use config::PlatformConfig;
pub use error::PlatformError;
