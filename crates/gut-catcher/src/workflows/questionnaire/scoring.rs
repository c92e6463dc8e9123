use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::catalog::{Catalog, OptionWeights, ScoringProfiles};
use super::persona::filter_for_persona;
use super::weights::WeightResolver;

/// Question id → selected option.
pub type AnswerSet = BTreeMap<String, String>;

/// Readiness score for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub title: String,
    /// `None` when no answered question contributed to the denominator.
    pub percent: Option<f64>,
    pub answered: usize,
}

/// Per-section scores keyed by section id, kept in catalog order.
///
/// Serialized as a JSON object whose keys follow catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionScores(Vec<(String, SectionScore)>);

impl SectionScores {
    pub fn get(&self, section_id: &str) -> Option<&SectionScore> {
        self.0
            .iter()
            .find(|(id, _)| id == section_id)
            .map(|(_, score)| score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionScore)> {
        self.0.iter().map(|(id, score)| (id.as_str(), score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, section_id: String, score: SectionScore) {
        self.0.push((section_id, score));
    }
}

impl Serialize for SectionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, score) in &self.0 {
            map.serialize_entry(id, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SectionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SectionScores;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of section id to section score")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut scores = SectionScores::default();
                while let Some((id, score)) = access.next_entry::<String, SectionScore>()? {
                    scores.push(id, score);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Per-section and overall readiness for one answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub per_section: SectionScores,
    pub overall: Option<f64>,
    pub persona: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    numerator: f64,
    denominator: f64,
    answered: usize,
}

impl Tally {
    fn percent(&self) -> Option<f64> {
        (self.denominator > 0.0).then(|| self.numerator / self.denominator * 100.0)
    }
}

/// Scores `answers` against an already persona-filtered catalog.
///
/// Unanswered questions (absent or blank selections) count toward neither the
/// numerator nor the denominator. Answers for ids outside `filtered` are ignored,
/// and options the question does not declare are still weighed through the
/// regular fallback chain.
pub fn score(
    answers: &AnswerSet,
    filtered: &Catalog,
    profile: &OptionWeights,
    persona: &str,
) -> ScoreResult {
    let resolver = WeightResolver::new(profile);
    let mut per_section = SectionScores::default();
    let mut overall = Tally::default();

    for section in filtered.sections() {
        let mut tally = Tally::default();

        for question in &section.items {
            let Some(selected) = answers
                .get(&question.id)
                .filter(|selected| !selected.is_empty())
            else {
                continue;
            };
            tally.numerator += resolver.weight_of(question, selected);
            tally.denominator += resolver.max_weight_of(question);
            tally.answered += 1;
        }

        let percent = tally.percent();
        if percent.is_some() {
            overall.numerator += tally.numerator;
            overall.denominator += tally.denominator;
        }

        per_section.push(
            section.id.clone(),
            SectionScore {
                title: section.title.clone(),
                percent,
                answered: tally.answered,
            },
        );
    }

    ScoreResult {
        per_section,
        overall: overall.percent(),
        persona: persona.to_string(),
    }
}

/// Filters `catalog` for `persona`, picks its weight profile and scores `answers`.
///
/// This is the one entry point shared by the live preview and stored submissions,
/// so both always agree for the same inputs.
pub fn evaluate(
    catalog: &Catalog,
    profiles: &ScoringProfiles,
    persona: &str,
    answers: &AnswerSet,
) -> ScoreResult {
    let filtered = filter_for_persona(catalog, persona);
    score(answers, &filtered, profiles.profile_for(persona), persona)
}
