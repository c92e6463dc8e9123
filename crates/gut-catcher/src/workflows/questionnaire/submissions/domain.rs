use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflows::questionnaire::scoring::{AnswerSet, ScoreResult};

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Client-supplied context attached to a submission.
///
/// `page`, `tz` and `persona` are recognized; any other keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionMeta {
    fn from_object(object: Map<String, Value>) -> Self {
        let mut meta = SubmissionMeta::default();
        for (key, value) in object {
            match (key.as_str(), value) {
                ("page", Value::String(page)) => meta.page = Some(page),
                ("tz", Value::String(tz)) => meta.tz = Some(tz),
                ("persona", Value::String(persona)) => meta.persona = Some(persona),
                (_, value) => {
                    meta.extra.insert(key, value);
                }
            }
        }
        meta
    }
}

/// Lead submission as posted by the questionnaire client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub email: String,
    pub answers: AnswerSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SubmissionMeta>,
}

impl SubmissionRequest {
    /// Validates a raw JSON body at the HTTP boundary.
    ///
    /// The email is checked first, then the answer map; `meta` is dropped unless it
    /// is an object.
    pub fn from_json(body: Value) -> Result<Self, SubmissionValidationError> {
        let mut object = match body {
            Value::Object(object) => object,
            _ => Map::new(),
        };

        let email = match object.remove("email") {
            Some(Value::String(email)) if is_valid_email(&email) => email,
            _ => return Err(SubmissionValidationError::InvalidEmail),
        };

        let answers = match object.remove("answers") {
            Some(Value::Object(answers)) => answers
                .into_iter()
                .map(|(question_id, selected)| match selected {
                    Value::String(option) => Ok((question_id, option)),
                    _ => Err(SubmissionValidationError::AnswerNotText { question_id }),
                })
                .collect::<Result<AnswerSet, _>>()?,
            _ => return Err(SubmissionValidationError::AnswersNotObject),
        };

        let meta = match object.remove("meta") {
            Some(Value::Object(meta)) => Some(SubmissionMeta::from_object(meta)),
            _ => None,
        };

        Ok(Self {
            email,
            answers,
            meta,
        })
    }

    pub fn validate(&self) -> Result<(), SubmissionValidationError> {
        if is_valid_email(&self.email) {
            Ok(())
        } else {
            Err(SubmissionValidationError::InvalidEmail)
        }
    }

    pub fn persona(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|meta| meta.persona.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionValidationError {
    #[error("A valid email is required.")]
    InvalidEmail,
    #[error("Answers must be an object.")]
    AnswersNotObject,
    #[error("Answers must map question ids to option strings.")]
    AnswerNotText { question_id: String },
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".+@.+\..+").expect("email pattern compiles"))
}

/// Loose shape check: at least five characters with an `@` and a dot after it.
pub fn is_valid_email(email: &str) -> bool {
    let trimmed = email.trim();
    trimmed.chars().count() >= 5 && email_pattern().is_match(trimmed)
}

/// Request metadata captured by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Persisted submission, including the authoritative server-side score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub email: String,
    pub answers: AnswerSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SubmissionMeta>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub score: ScoreResult,
}
