//! Service Layer
//!
//! Business logic services for the platform.
//! Includes authentication, the complaint lifecycle and notification services.

pub mod assignment;
pub mod authorization;
pub mod complaint;
pub mod credentials;
pub mod evidence;
pub mod mailer;
pub mod notification;
pub mod password;
pub mod token;

pub use assignment::{AssignmentPolicy, UniformRandomAssignment, RoundRobinAssignment, policy_for};
pub use authorization::{AccessGate, AuthContext, extract_bearer_token};
pub use complaint::{ComplaintService, SubmitComplaint, AdvanceComplaint, SubmitOutcome, TransitionOutcome};
pub use credentials::{CredentialService, RegisterCandidate};
pub use evidence::{EvidenceStore, LocalEvidenceStore};
pub use mailer::{Mailer, HttpMailer, LogMailer, MailError};
pub use notification::{
    NotificationService, NotificationReport, NotificationFailure, FailureReason,
    LifecycleEvent, Notification, Recipient, notifications_for,
};
pub use password::{PasswordService, PasswordPolicy};
pub use token::{TokenService, AccessTokenClaims, IssuedToken, TokenError};
