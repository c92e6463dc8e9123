use super::domain::SubmissionRecord;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn append(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError>;
    fn list(&self) -> Result<Vec<SubmissionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("submission store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("submission store holds invalid json: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired after a submission is stored (e-mail, chat, CRM adapters).
pub trait SubmissionNotifier: Send + Sync {
    fn notify(&self, record: &SubmissionRecord) -> Result<NotificationOutcome, NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    /// No recipient or transport configured.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
