use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Deserializer, Serialize};

use super::persona::labels_admit;

/// Ordered collection of sections making up the questionnaire.
///
/// Section order and question order inside each section are significant: they
/// drive step-wise navigation and the order of per-section scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    sections: Vec<Section>,
}

impl Catalog {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }

    /// Finds a question and its owning section. The first match wins when ids collide.
    pub fn locate(&self, question_id: &str) -> Option<(&Section, &Question)> {
        self.sections.iter().find_map(|section| {
            section
                .items
                .iter()
                .find(|question| question.id == question_id)
                .map(|question| (section, question))
        })
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.locate(question_id).map(|(_, question)| question)
    }

    /// Structural problems that make id lookups ambiguous or questions unanswerable.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut section_ids = HashSet::new();
        let mut question_ids = HashSet::new();

        for section in &self.sections {
            if !section_ids.insert(section.id.as_str()) {
                issues.push(CatalogIssue::DuplicateSection(section.id.clone()));
            }
            for question in &section.items {
                if !question_ids.insert(question.id.as_str()) {
                    issues.push(CatalogIssue::DuplicateQuestion(question.id.clone()));
                }
                if question.options.is_empty() {
                    issues.push(CatalogIssue::QuestionWithoutOptions(question.id.clone()));
                }
            }
        }

        issues
    }
}

impl From<Vec<Section>> for Catalog {
    fn from(sections: Vec<Section>) -> Self {
        Self::new(sections)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogIssue {
    #[error("section id '{0}' appears more than once")]
    DuplicateSection(String),
    #[error("question id '{0}' appears more than once")]
    DuplicateQuestion(String),
    #[error("question '{0}' declares no options")]
    QuestionWithoutOptions(String),
}

/// Named group of related questions; the unit of per-group scoring and of navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub labels: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Question>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, items: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            labels: BTreeSet::new(),
            items,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_visible_to(&self, persona: &str) -> bool {
        labels_admit(&self.labels, persona)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "OptionWeights::is_empty")]
    pub scores: OptionWeights,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub details: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_study: Option<CaseStudy>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub labels: BTreeSet<String>,
}

impl Question {
    pub fn new<I, S>(id: impl Into<String>, title: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            options: options.into_iter().map(Into::into).collect(),
            scores: OptionWeights::default(),
            details: BTreeMap::new(),
            case_study: None,
            labels: BTreeSet::new(),
        }
    }

    /// Yes/No question, the shape most of the catalog uses.
    pub fn yes_no(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, ["Yes", "No"])
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_scores<I, S>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.scores = scores.into_iter().collect();
        self
    }

    pub fn with_detail(mut self, option: impl Into<String>, text: impl Into<String>) -> Self {
        self.details.insert(option.into(), text.into());
        self
    }

    pub fn with_case_study(mut self, case_study: CaseStudy) -> Self {
        self.case_study = Some(case_study);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_visible_to(&self, persona: &str) -> bool {
        labels_admit(&self.labels, persona)
    }

    /// Follow-up text shown once `option` is selected.
    pub fn detail_for(&self, option: &str) -> Option<&str> {
        self.details.get(option).map(String::as_str)
    }
}

/// Media attached to a question to illustrate past work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudy {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CaseStudy {
    /// A case study without a source renders as a placeholder.
    pub fn has_media(&self) -> bool {
        !self.src.trim().is_empty() && self.kind != MediaKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    #[serde(other)]
    Other,
}

/// Audience segment used to filter questions and select a weight table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub title: String,
}

impl Persona {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Option → weight table.
///
/// Entries whose value is not a JSON number are dropped while deserializing, so a
/// lookup only ever yields numeric weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionWeights(BTreeMap<String, f64>);

impl OptionWeights {
    pub fn get(&self, option: &str) -> Option<f64> {
        self.0.get(option).copied()
    }

    pub fn insert(&mut self, option: impl Into<String>, weight: f64) {
        self.0.insert(option.into(), weight);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(option, weight)| (option.as_str(), *weight))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for OptionWeights {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(option, weight)| (option.into(), weight))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for OptionWeights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(option, value)| value.as_f64().map(|weight| (option, weight)))
            .collect())
    }
}

/// Persona id → weight table, with `"default"` as the fallback profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringProfiles(BTreeMap<String, OptionWeights>);

static EMPTY_PROFILE: OptionWeights = OptionWeights(BTreeMap::new());

impl ScoringProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, persona: impl Into<String>, weights: OptionWeights) -> Self {
        self.0.insert(persona.into(), weights);
        self
    }

    pub fn get(&self, persona: &str) -> Option<&OptionWeights> {
        self.0.get(persona)
    }

    /// The persona's own table, else the default table, else an empty table.
    pub fn profile_for(&self, persona: &str) -> &OptionWeights {
        self.0
            .get(persona)
            .or_else(|| self.0.get(super::persona::DEFAULT_PERSONA))
            .unwrap_or(&EMPTY_PROFILE)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
