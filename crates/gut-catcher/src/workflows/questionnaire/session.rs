use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, Question, ScoringProfiles, Section};
use super::persona::{filter_for_persona, DEFAULT_PERSONA};
use super::scoring::{evaluate, AnswerSet, ScoreResult};
use super::submissions::{SubmissionMeta, SubmissionRequest};

/// Where a session currently is in the welcome → sections → review flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Welcome,
    /// Zero-based index into the persona-filtered sections.
    Section(usize),
    Review,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Welcome => "Welcome",
            Step::Section(_) => "Section",
            Step::Review => "Review",
        }
    }
}

/// One in-progress questionnaire fill-out.
///
/// Each visitor owns an independent session; the catalog is borrowed per call so a
/// reloaded catalog is picked up on the next navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireSession {
    persona: String,
    answers: AnswerSet,
    step: usize,
}

impl Default for QuestionnaireSession {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl QuestionnaireSession {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            answers: AnswerSet::new(),
            step: 0,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Switches persona and returns to the welcome step. Answers are kept.
    pub fn select_persona(&mut self, persona: impl Into<String>) {
        self.persona = persona.into();
        self.step = 0;
    }

    /// Records `option` for `question` and returns the follow-up detail, if any.
    pub fn select<'q>(&mut self, question: &'q Question, option: &str) -> Option<&'q str> {
        self.answers.insert(question.id.clone(), option.to_string());
        question.detail_for(option)
    }

    pub fn visible_sections(&self, catalog: &Catalog) -> Catalog {
        filter_for_persona(catalog, &self.persona)
    }

    /// Welcome + one step per visible section + review.
    pub fn total_steps(&self, catalog: &Catalog) -> usize {
        self.visible_sections(catalog).len() + 2
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn step(&self, catalog: &Catalog) -> Step {
        let last = self.total_steps(catalog) - 1;
        match self.step.min(last) {
            0 => Step::Welcome,
            index if index == last => Step::Review,
            index => Step::Section(index - 1),
        }
    }

    pub fn go_to(&mut self, step: usize, catalog: &Catalog) -> Step {
        self.step = step.min(self.total_steps(catalog) - 1);
        self.step(catalog)
    }

    pub fn next(&mut self, catalog: &Catalog) -> Step {
        self.go_to(self.step.saturating_add(1), catalog)
    }

    pub fn back(&mut self, catalog: &Catalog) -> Step {
        self.go_to(self.step.saturating_sub(1), catalog)
    }

    pub fn is_at_review(&self, catalog: &Catalog) -> bool {
        self.step(catalog) == Step::Review
    }

    pub fn current_section(&self, catalog: &Catalog) -> Option<Section> {
        match self.step(catalog) {
            Step::Section(index) => self
                .visible_sections(catalog)
                .into_sections()
                .into_iter()
                .nth(index),
            Step::Welcome | Step::Review => None,
        }
    }

    /// `Step 2 of 4 • Section`
    pub fn progress_label(&self, catalog: &Catalog) -> String {
        let total = self.total_steps(catalog);
        let human = (self.step + 1).min(total);
        format!("Step {human} of {total} • {}", self.step(catalog).label())
    }

    pub fn preview(&self, catalog: &Catalog, profiles: &ScoringProfiles) -> ScoreResult {
        evaluate(catalog, profiles, &self.persona, &self.answers)
    }

    pub fn to_submission(&self, email: impl Into<String>, meta: SubmissionMeta) -> SubmissionRequest {
        SubmissionRequest {
            email: email.into(),
            answers: self.answers.clone(),
            meta: Some(SubmissionMeta {
                persona: Some(self.persona.clone()),
                ..meta
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Section::new(
                "strategy",
                "Strategy",
                vec![Question::yes_no("goals", "Goals?")
                    .with_detail("Yes", "We will map them into milestones.")],
            ),
            Section::new("sales", "Sales", vec![Question::yes_no("pipeline", "Pipeline?")])
                .with_labels(["sales"]),
        ])
    }

    fn profiles() -> ScoringProfiles {
        ScoringProfiles::new().with_profile("default", [("Yes", 1.0), ("No", 0.0)].into_iter().collect())
    }

    #[test]
    fn walks_welcome_sections_review() {
        let catalog = catalog();
        let mut session = QuestionnaireSession::default();

        assert_eq!(session.total_steps(&catalog), 4);
        assert_eq!(session.step(&catalog), Step::Welcome);
        assert_eq!(session.next(&catalog), Step::Section(0));
        assert_eq!(
            session.current_section(&catalog).map(|section| section.id),
            Some("strategy".to_string())
        );
        assert_eq!(session.progress_label(&catalog), "Step 2 of 4 • Section");
        assert_eq!(session.next(&catalog), Step::Section(1));
        assert_eq!(session.next(&catalog), Step::Review);
        assert_eq!(session.next(&catalog), Step::Review, "clamped at review");
        assert!(session.current_section(&catalog).is_none());
    }

    #[test]
    fn back_is_clamped_at_welcome() {
        let catalog = catalog();
        let mut session = QuestionnaireSession::default();
        assert_eq!(session.back(&catalog), Step::Welcome);
        assert_eq!(session.step_index(), 0);
    }

    #[test]
    fn persona_change_resets_to_welcome_and_keeps_answers() {
        let catalog = catalog();
        let mut session = QuestionnaireSession::new("sales");
        let goals = catalog.question("goals").expect("goals present").clone();

        session.go_to(2, &catalog);
        session.select(&goals, "Yes");
        session.select_persona("founder");

        assert_eq!(session.step(&catalog), Step::Welcome);
        assert_eq!(session.total_steps(&catalog), 3);
        assert_eq!(session.answer_for("goals"), Some("Yes"));
    }

    #[test]
    fn select_returns_detail_text() {
        let catalog = catalog();
        let goals = catalog.question("goals").expect("goals present");
        let mut session = QuestionnaireSession::default();

        assert_eq!(
            session.select(goals, "Yes"),
            Some("We will map them into milestones.")
        );
        assert_eq!(session.select(goals, "No"), None);
        assert_eq!(session.answer_for("goals"), Some("No"));
    }

    #[test]
    fn preview_matches_direct_evaluation() {
        let catalog = catalog();
        let mut session = QuestionnaireSession::new("sales");
        for id in ["goals", "pipeline"] {
            let question = catalog.question(id).expect("question present").clone();
            session.select(&question, "Yes");
        }

        let preview = session.preview(&catalog, &profiles());

        assert_eq!(
            preview,
            evaluate(&catalog, &profiles(), "sales", session.answers())
        );
        assert_eq!(preview.overall, Some(100.0));
    }

    #[test]
    fn submission_carries_session_persona() {
        let mut session = QuestionnaireSession::new("sales");
        let question = Question::yes_no("goals", "Goals?");
        session.select(&question, "Yes");

        let request = session.to_submission(
            "lead@example.com",
            SubmissionMeta {
                page: Some("/".to_string()),
                ..SubmissionMeta::default()
            },
        );

        let meta = request.meta.expect("meta attached");
        assert_eq!(meta.persona.as_deref(), Some("sales"));
        assert_eq!(meta.page.as_deref(), Some("/"));
        assert_eq!(request.answers.get("goals").map(String::as_str), Some("Yes"));
    }
}
