//! Persona-aware questionnaire: catalog, filtering, weighted scoring and lead intake.
//!
//! The scoring path (`persona`, `weights`, `scoring`) is pure and shared by the
//! interactive session preview and the server-side submission score.

pub mod catalog;
pub mod persona;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod submissions;
pub mod weights;

pub use catalog::{
    CaseStudy, Catalog, CatalogIssue, MediaKind, OptionWeights, Persona, Question,
    ScoringProfiles, Section,
};
pub use persona::{default_personas, filter_for_persona, resolve_persona, DEFAULT_PERSONA};
pub use scoring::{evaluate, score, AnswerSet, ScoreResult, SectionScore, SectionScores};
pub use session::{QuestionnaireSession, Step};
pub use storage::{
    default_catalog, default_scoring_profiles, JsonFileStore, JsonSubmissionRepository,
    QuestionnaireSnapshot, QuestionnaireSource, StorageError,
};
pub use weights::{max_weight_of, weight_of, WeightResolver, WeightSource, MIN_MAX_WEIGHT};
