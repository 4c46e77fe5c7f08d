//! Notification Service
//!
//! Decides who hears about each lifecycle event and delivers the mail.
//! Delivery is best-effort: a failure is logged and reported back to the
//! caller, and never undoes the state change that triggered it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::config::MailConfig;
use crate::domain::{Complaint, ComplaintStatus, Identity, Role};
use crate::repository::IdentityRepository;
use crate::service::mailer::{MailError, Mailer};

/// Lifecycle event that can trigger mail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Submitted,
    Transitioned { from: ComplaintStatus, to: ComplaintStatus },
}

impl LifecycleEvent {
    pub fn name(&self) -> String {
        match self {
            LifecycleEvent::Submitted => "submitted".to_string(),
            LifecycleEvent::Transitioned { from, to } => format!("{}->{}", from, to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A single identity by id
    Identity(String),
    /// Every identity holding the role
    Role(Role),
}

impl Recipient {
    /// Identity id, or the role name
    pub fn label(&self) -> String {
        match self {
            Recipient::Identity(id) => id.clone(),
            Recipient::Role(role) => role.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    RecipientNotFound,
    NoRoleHolder,
    RecipientLookupFailed,
    DeliveryFailed,
    /// Still pending when the dispatch deadline passed
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFailure {
    /// Identity id, or the role name when no holder could be resolved
    pub recipient: String,
    pub reason: FailureReason,
}

/// Outcome of the notifications sent for one event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    /// Identity ids that were mailed
    pub delivered: Vec<String>,
    pub failures: Vec<NotificationFailure>,
}

impl NotificationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The notification table: which mails an event produces.
pub fn notifications_for(event: LifecycleEvent, complaint: &Complaint) -> Vec<Notification> {
    let course = &complaint.course_concerned;
    let student = &complaint.requesting_student;
    let lecturer = &complaint.responding_lecturer;

    let to_student = |what: &str| Notification {
        recipient: Recipient::Identity(student.clone()),
        subject: format!("Update on your revalidation request for {}", course),
        body: format!(
            "Your revalidation request concerning {} (assigned to {}) has been {}.\n\
             Log in to the portal for details.",
            course, lecturer, what
        ),
    };

    match event {
        LifecycleEvent::Submitted => vec![Notification {
            recipient: Recipient::Identity(lecturer.clone()),
            subject: format!("New revalidation request for {}", course),
            body: format!(
                "Student {} has submitted a revalidation request concerning {}.\n\
                 Log in to the portal to review it.",
                student, course
            ),
        }],
        LifecycleEvent::Transitioned { to, from } => match to {
            ComplaintStatus::ApprovedByLecturer => vec![
                to_student("approved by the lecturer"),
                Notification {
                    recipient: Recipient::Role(Role::HeadOfDepartment),
                    subject: format!("Revalidation request from {} concerning {}", lecturer, course),
                    body: format!(
                        "Lecturer {} has approved the revalidation request of student {} \
                         concerning {}.\nIt will reach you after course advisor review.",
                        lecturer, student, course
                    ),
                },
            ],
            ComplaintStatus::ApprovedByCourseAdvisor => Vec::new(),
            ComplaintStatus::ApprovedByHod => vec![
                to_student("approved by the head of department"),
                Notification {
                    recipient: Recipient::Role(Role::Senate),
                    subject: format!("Revalidation request awaiting senate review: {}", course),
                    body: format!(
                        "The revalidation request of student {} concerning {} has been \
                         approved by the head of department and awaits senate review.",
                        student, course
                    ),
                },
            ],
            ComplaintStatus::ApprovedBySenate => vec![to_student("approved by the senate")],
            ComplaintStatus::Declined => {
                let declined = format!("declined at the {} stage", from.label());
                vec![to_student(&declined)]
            }
            ComplaintStatus::Pending => Vec::new(),
        },
    }
}

pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    identities: Arc<dyn IdentityRepository>,
    timeout: Duration,
    max_attempts: u32,
    retry_backoff: Duration,
    deadline: Duration,
}

impl NotificationService {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        identities: Arc<dyn IdentityRepository>,
        config: &MailConfig,
    ) -> Self {
        Self {
            mailer,
            identities,
            timeout: config.timeout,
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff,
            deadline: config.dispatch_deadline,
        }
    }

    /// Send every notification the event calls for.
    ///
    /// Recipients are mailed concurrently and the whole dispatch is bounded
    /// by the configured deadline. Deliveries still running at the deadline
    /// are abandoned and reported as `DeadlineExceeded`.
    pub async fn dispatch(&self, complaint: &Complaint, event: LifecycleEvent) -> NotificationReport {
        let deadline = Instant::now() + self.deadline;
        let mut report = NotificationReport::default();

        let notifications = notifications_for(event, complaint);
        let mut deliveries: Vec<(Identity, &Notification)> = Vec::new();
        for notification in &notifications {
            let resolved = timeout_at(deadline, self.resolve(&notification.recipient))
                .await
                .unwrap_or_else(|_| {
                    Err(NotificationFailure {
                        recipient: notification.recipient.label(),
                        reason: FailureReason::DeadlineExceeded,
                    })
                });
            match resolved {
                Ok(recipients) => {
                    deliveries.extend(recipients.into_iter().map(|identity| (identity, notification)));
                }
                Err(failure) => {
                    warn!(
                        complaint_id = %complaint.id,
                        event = %event.name(),
                        recipient = %failure.recipient,
                        reason = ?failure.reason,
                        "Notification recipient could not be resolved"
                    );
                    report.failures.push(failure);
                }
            }
        }

        let sends = deliveries.iter().map(|(identity, notification)| async move {
            let outcome = timeout_at(deadline, self.send_with_retry(&identity.email, notification)).await;
            (identity, outcome)
        });

        for (identity, outcome) in join_all(sends).await {
            match outcome {
                Ok(Ok(())) => {
                    debug!(complaint_id = %complaint.id, recipient = %identity.id, "Notification delivered");
                    report.delivered.push(identity.id.clone());
                }
                Ok(Err(e)) => {
                    error!(
                        complaint_id = %complaint.id,
                        event = %event.name(),
                        recipient = %identity.id,
                        error = %e,
                        "Notification delivery failed"
                    );
                    report.failures.push(NotificationFailure {
                        recipient: identity.id.clone(),
                        reason: FailureReason::DeliveryFailed,
                    });
                }
                Err(_) => {
                    error!(
                        complaint_id = %complaint.id,
                        event = %event.name(),
                        recipient = %identity.id,
                        deadline_ms = self.deadline.as_millis() as u64,
                        "Notification delivery abandoned at the dispatch deadline"
                    );
                    report.failures.push(NotificationFailure {
                        recipient: identity.id.clone(),
                        reason: FailureReason::DeadlineExceeded,
                    });
                }
            }
        }

        if !report.delivered.is_empty() || !report.failures.is_empty() {
            info!(
                complaint_id = %complaint.id,
                event = %event.name(),
                delivered = report.delivered.len(),
                failed = report.failures.len(),
                "Notifications dispatched"
            );
        }
        report
    }

    async fn resolve(&self, recipient: &Recipient) -> Result<Vec<Identity>, NotificationFailure> {
        match recipient {
            Recipient::Identity(id) => match self.identities.find_by_id(id).await {
                Ok(Some(identity)) => Ok(vec![identity]),
                Ok(None) => Err(NotificationFailure {
                    recipient: id.clone(),
                    reason: FailureReason::RecipientNotFound,
                }),
                Err(e) => {
                    error!(recipient = %id, error = %e, "Recipient lookup failed");
                    Err(NotificationFailure {
                        recipient: id.clone(),
                        reason: FailureReason::RecipientLookupFailed,
                    })
                }
            },
            Recipient::Role(role) => match self.identities.find_by_role(*role).await {
                Ok(holders) if holders.is_empty() => Err(NotificationFailure {
                    recipient: role.to_string(),
                    reason: FailureReason::NoRoleHolder,
                }),
                Ok(holders) => Ok(holders),
                Err(e) => {
                    error!(role = %role, error = %e, "Recipient lookup failed");
                    Err(NotificationFailure {
                        recipient: role.to_string(),
                        reason: FailureReason::RecipientLookupFailed,
                    })
                }
            },
        }
    }

    async fn send_with_retry(&self, email: &str, notification: &Notification) -> Result<(), MailError> {
        let mut attempt = 1;
        loop {
            let sent = tokio::time::timeout(
                self.timeout,
                self.mailer.send(email, &notification.subject, &notification.body),
            )
            .await
            .unwrap_or(Err(MailError::Timeout(self.timeout)));

            match sent {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    warn!(attempt, error = %e, "Mail attempt failed, retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
