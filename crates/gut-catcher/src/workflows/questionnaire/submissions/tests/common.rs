use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::workflows::questionnaire::catalog::{Catalog, Persona, Question, ScoringProfiles, Section};
use crate::workflows::questionnaire::storage::QuestionnaireSnapshot;
use crate::workflows::questionnaire::submissions::repository::{
    NotificationOutcome, NotifyError, RepositoryError, SubmissionNotifier, SubmissionRepository,
};
use crate::workflows::questionnaire::submissions::{
    questionnaire_router, SubmissionRecord, SubmissionService,
};

pub(super) fn catalog() -> Catalog {
    Catalog::new(vec![
        Section::new(
            "strategy",
            "Strategy",
            vec![
                Question::yes_no("goals", "Do you have clear goals?"),
                Question::yes_no("budget", "Is budget approved?").with_scores([("Yes", 3.0)]),
            ],
        ),
        Section::new(
            "growth",
            "Growth",
            vec![Question::yes_no("channels", "Do you have priority channels?")
                .with_labels(["marketing"])],
        ),
        Section::new(
            "ops",
            "Operations",
            vec![Question::yes_no("sla", "Do you need an SLA?")],
        )
        .with_labels(["enterprise"]),
    ])
}

pub(super) fn personas() -> Vec<Persona> {
    vec![
        Persona::new("default", "General"),
        Persona::new("marketing", "Marketing Lead"),
        Persona::new("enterprise", "Enterprise Buyer"),
    ]
}

pub(super) fn profiles() -> ScoringProfiles {
    ScoringProfiles::new()
        .with_profile("default", [("Yes", 1.0), ("No", 0.0)].into_iter().collect())
        .with_profile("marketing", [("Yes", 2.0), ("No", 0.0)].into_iter().collect())
}

pub(super) fn snapshot() -> QuestionnaireSnapshot {
    QuestionnaireSnapshot {
        catalog: catalog(),
        personas: personas(),
        profiles: profiles(),
    }
}

pub(super) fn submission_body() -> Value {
    json!({
        "email": "lead@example.com",
        "answers": { "goals": "Yes", "budget": "No", "channels": "Yes" },
        "meta": { "page": "/", "tz": "Europe/Berlin", "persona": "marketing", "utm": "spring" }
    })
}

pub(super) type TestService = SubmissionService<QuestionnaireSnapshot, MemoryRepository, MemoryNotifier>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifier>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = SubmissionService::new(Arc::new(snapshot()), repository.clone(), notifier.clone());
    (service, repository, notifier)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    questionnaire_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl MemoryRepository {
    pub(super) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

impl SubmissionRepository for MemoryRepository {
    fn append(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Ok(self.records())
    }
}

pub(super) struct UnavailableRepository;

impl SubmissionRepository for UnavailableRepository {
    fn append(&self, _record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    delivered: Arc<Mutex<Vec<String>>>,
}

impl MemoryNotifier {
    pub(super) fn delivered(&self) -> Vec<String> {
        self.delivered.lock().expect("notifier mutex poisoned").clone()
    }
}

impl SubmissionNotifier for MemoryNotifier {
    fn notify(&self, record: &SubmissionRecord) -> Result<NotificationOutcome, NotifyError> {
        self.delivered
            .lock()
            .expect("notifier mutex poisoned")
            .push(record.email.clone());
        Ok(NotificationOutcome::Delivered)
    }
}

pub(super) struct BrokenNotifier;

impl SubmissionNotifier for BrokenNotifier {
    fn notify(&self, _record: &SubmissionRecord) -> Result<NotificationOutcome, NotifyError> {
        Err(NotifyError::Transport("relay refused connection".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
