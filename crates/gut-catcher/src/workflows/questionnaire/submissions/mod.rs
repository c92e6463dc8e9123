//! Lead submission intake: boundary validation, scoring, persistence and notification.

pub mod domain;
pub mod notify;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    is_valid_email, ClientContext, SubmissionId, SubmissionMeta, SubmissionRecord,
    SubmissionRequest, SubmissionValidationError,
};
pub use notify::{MailLogNotifier, NotificationMessage};
pub use repository::{
    NotificationOutcome, NotifyError, RepositoryError, SubmissionNotifier, SubmissionRepository,
};
pub use router::questionnaire_router;
pub use service::{SubmissionService, SubmissionServiceError};
