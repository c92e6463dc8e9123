use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::workflows::questionnaire::catalog::{Catalog, Persona, ScoringProfiles};
use crate::workflows::questionnaire::persona::resolve_persona;
use crate::workflows::questionnaire::scoring::evaluate;
use crate::workflows::questionnaire::storage::QuestionnaireSource;

use super::domain::{
    ClientContext, SubmissionId, SubmissionRecord, SubmissionRequest, SubmissionValidationError,
};
use super::repository::{RepositoryError, SubmissionNotifier, SubmissionRepository};

/// Service composing the questionnaire source, scoring engine, repository and notifier.
pub struct SubmissionService<S, R, N> {
    source: Arc<S>,
    repository: Arc<R>,
    notifier: Arc<N>,
}

static LAST_SUBMISSION_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp ids, bumped forward when two submissions share a millisecond.
fn next_submission_id(now: DateTime<Utc>) -> SubmissionId {
    let candidate = now.timestamp_millis();
    let previous = LAST_SUBMISSION_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(candidate.max(last + 1))
        })
        .unwrap_or(candidate);
    SubmissionId(candidate.max(previous + 1).to_string())
}

impl<S, R, N> SubmissionService<S, R, N>
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    pub fn new(source: Arc<S>, repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            source,
            repository,
            notifier,
        }
    }

    pub fn catalog(&self) -> Catalog {
        self.source.catalog()
    }

    pub fn personas(&self) -> Vec<Persona> {
        self.source.personas()
    }

    pub fn scoring_profiles(&self) -> ScoringProfiles {
        self.source.scoring_profiles()
    }

    /// Score, persist and announce a submission.
    ///
    /// Notification failures are logged and do not fail the submission.
    pub fn submit(
        &self,
        request: SubmissionRequest,
        context: ClientContext,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        request.validate()?;

        let catalog = self.source.catalog();
        let profiles = self.source.scoring_profiles();
        let personas = self.source.personas();
        let persona = resolve_persona(request.persona(), &personas);
        let score = evaluate(&catalog, &profiles, &persona, &request.answers);

        let created_at = Utc::now();
        let record = SubmissionRecord {
            id: next_submission_id(created_at),
            email: request.email.trim().to_string(),
            answers: request.answers,
            meta: request.meta,
            created_at,
            ip: context.ip,
            user_agent: context.user_agent,
            score,
        };

        let stored = self.repository.append(record)?;
        info!(
            submission_id = %stored.id.0,
            persona = %stored.score.persona,
            overall = ?stored.score.overall,
            "submission stored"
        );

        if let Err(err) = self.notifier.notify(&stored) {
            warn!(submission_id = %stored.id.0, error = %err, "submission notification failed");
        }

        Ok(stored)
    }

    pub fn list(&self) -> Result<Vec<SubmissionRecord>, SubmissionServiceError> {
        Ok(self.repository.list()?)
    }
}

/// Error raised by the submission service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Validation(#[from] SubmissionValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
