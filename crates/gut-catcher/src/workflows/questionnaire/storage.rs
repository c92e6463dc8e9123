use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::catalog::{CaseStudy, Catalog, MediaKind, Persona, Question, ScoringProfiles, Section};
use super::persona::{default_personas, DEFAULT_PERSONA};
use super::submissions::{RepositoryError, SubmissionRecord, SubmissionRepository};

pub const QUESTIONS_FILE: &str = "questions.json";
pub const PERSONAS_FILE: &str = "personas.json";
pub const SCORING_FILE: &str = "scoring.json";
pub const SUBMISSIONS_FILE: &str = "submissions.json";

/// Read-only access to the questionnaire definition.
///
/// Reads never fail: an unavailable source yields the documented defaults so the
/// questionnaire keeps working and scoring stays deterministic.
pub trait QuestionnaireSource: Send + Sync {
    fn catalog(&self) -> Catalog;
    fn personas(&self) -> Vec<Persona>;
    fn scoring_profiles(&self) -> ScoringProfiles;

    fn snapshot(&self) -> QuestionnaireSnapshot {
        QuestionnaireSnapshot {
            catalog: self.catalog(),
            personas: self.personas(),
            profiles: self.scoring_profiles(),
        }
    }
}

/// Fixed, in-memory questionnaire definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionnaireSnapshot {
    pub catalog: Catalog,
    pub personas: Vec<Persona>,
    pub profiles: ScoringProfiles,
}

impl QuestionnaireSource for QuestionnaireSnapshot {
    fn catalog(&self) -> Catalog {
        self.catalog.clone()
    }

    fn personas(&self) -> Vec<Persona> {
        self.personas.clone()
    }

    fn scoring_profiles(&self) -> ScoringProfiles {
        self.profiles.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode seed data for {path}: {source}")]
    Seed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Questionnaire definition backed by JSON files in a data directory.
///
/// Files are re-read on every call so edits take effect without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, creating the directory and seeding missing
    /// `submissions.json` and `questions.json` files.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io {
            path: data_dir.clone(),
            source,
        })?;

        let store = Self { data_dir };
        store.seed(SUBMISSIONS_FILE, || Ok("[]".to_string()))?;
        store.seed(QUESTIONS_FILE, || serde_json::to_string_pretty(&default_catalog()))?;
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn submissions(&self) -> JsonSubmissionRepository {
        JsonSubmissionRepository::new(self.path_of(SUBMISSIONS_FILE))
    }

    fn seed<F>(&self, file: &str, contents: F) -> Result<(), StorageError>
    where
        F: FnOnce() -> Result<String, serde_json::Error>,
    {
        let path = self.path_of(file);
        if path.exists() {
            return Ok(());
        }
        let contents = contents().map_err(|source| StorageError::Seed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| StorageError::Io { path, source })
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.path_of(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "questionnaire file missing, using defaults");
                return None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "questionnaire file unreadable, using defaults");
                return None;
            }
        };

        if raw.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "questionnaire file malformed, using defaults");
                None
            }
        }
    }
}

impl QuestionnaireSource for JsonFileStore {
    fn catalog(&self) -> Catalog {
        let catalog: Catalog = self.read_json(QUESTIONS_FILE).unwrap_or_default();
        for issue in catalog.validate() {
            warn!(%issue, "questionnaire catalog issue");
        }
        catalog
    }

    fn personas(&self) -> Vec<Persona> {
        self.read_json(PERSONAS_FILE)
            .unwrap_or_else(default_personas)
    }

    fn scoring_profiles(&self) -> ScoringProfiles {
        self.read_json(SCORING_FILE)
            .unwrap_or_else(default_scoring_profiles)
    }
}

/// Append-only submission log stored as one pretty-printed JSON array.
///
/// Entries that do not parse as records are preserved on disk and skipped when
/// listing.
#[derive(Debug)]
pub struct JsonSubmissionRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSubmissionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Vec<Value> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %err, "submission log unreadable");
                }
                return Vec::new();
            }
        };

        let body = if raw.trim().is_empty() { "[]" } else { raw.as_str() };
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(path = %self.path.display(), "submission log is not an array");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "submission log malformed");
                Vec::new()
            }
        }
    }
}

impl SubmissionRepository for JsonSubmissionRepository {
    fn append(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("submission log lock poisoned".to_string()))?;

        let mut entries = self.read_entries();
        entries.push(serde_json::to_value(&record)?);
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Ok(self
            .read_entries()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable submission entry");
                    None
                }
            })
            .collect())
    }
}

/// `{ "default": { "Yes": 1, "No": 0 } }`
pub fn default_scoring_profiles() -> ScoringProfiles {
    ScoringProfiles::new().with_profile(
        DEFAULT_PERSONA,
        [("Yes", 1.0), ("No", 0.0)].into_iter().collect(),
    )
}

/// Starter questionnaire written to a fresh data directory.
pub fn default_catalog() -> Catalog {
    Catalog::new(vec![
        Section::new(
            "foundations",
            "Project Foundations",
            vec![
                Question::yes_no("goals", "Do you have clear project goals?")
                    .with_description("Helps us define success and align on outcomes.")
                    .with_detail("Yes", "Great. We will map them into milestones.")
                    .with_detail("No", "No problem. We can help you shape them together."),
                Question::yes_no("timing", "Is there a defined timeline?")
                    .with_description("Understanding timing informs approach and resourcing.")
                    .with_detail("Yes", "We will plan phases and checkpoints around your dates.")
                    .with_detail("No", "We can propose a realistic plan based on scope."),
                Question::yes_no("stakeholders", "Are key stakeholders identified?")
                    .with_description("Ensures decisions are efficient and feedback is clear."),
            ],
        )
        .with_description("Where the project stands today."),
        Section::new(
            "delivery",
            "Delivery Readiness",
            vec![
                Question::yes_no("assets", "Do you have brand assets ready?")
                    .with_description("Logos, guidelines, references, or prior work.")
                    .with_case_study(CaseStudy {
                        kind: MediaKind::Image,
                        src: String::new(),
                        title: Some("Case Study".to_string()),
                    }),
                Question::yes_no("channels", "Do you have priority channels?").with_description(
                    "Where will this work primarily live? (e.g., web, social, OOH).",
                ),
                Question::yes_no("measurement", "Is there a measurement plan?")
                    .with_description("How will performance be tracked and learned from?"),
            ],
        )
        .with_description("What is in place to ship and measure the work."),
    ])
}
