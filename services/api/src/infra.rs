use gut_catcher::config::NotificationConfig;
use gut_catcher::error::AppError;
use gut_catcher::workflows::questionnaire::submissions::{MailLogNotifier, SubmissionService};
use gut_catcher::workflows::questionnaire::{JsonFileStore, JsonSubmissionRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type QuestionnaireService =
    SubmissionService<JsonFileStore, JsonSubmissionRepository, MailLogNotifier>;

pub(crate) fn open_store(data_dir: &Path) -> Result<Arc<JsonFileStore>, AppError> {
    let store = JsonFileStore::open(data_dir)?;
    debug!(data_dir = %store.data_dir().display(), "questionnaire store opened");
    Ok(Arc::new(store))
}

pub(crate) fn questionnaire_service(
    store: Arc<JsonFileStore>,
    notifications: NotificationConfig,
) -> QuestionnaireService {
    let repository = Arc::new(store.submissions());
    let notifier = Arc::new(MailLogNotifier::new(notifications));
    SubmissionService::new(store, repository, notifier)
}
