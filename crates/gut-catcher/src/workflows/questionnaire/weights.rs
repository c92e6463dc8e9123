use super::catalog::{OptionWeights, Question};

/// Floor applied to a question's maximum weight so denominators stay positive.
pub const MIN_MAX_WEIGHT: f64 = 1.0;

/// One stage of the weight fallback chain.
#[derive(Debug, Clone, Copy)]
pub enum WeightSource<'a> {
    /// The question's own `scores` table.
    QuestionScores,
    /// The active persona's profile table (already resolved to the default profile when needed).
    Profile(&'a OptionWeights),
    /// Always answers with a fixed weight; terminates the chain.
    Constant(f64),
}

impl WeightSource<'_> {
    fn lookup(&self, question: &Question, option: &str) -> Option<f64> {
        match self {
            WeightSource::QuestionScores => question.scores.get(option),
            WeightSource::Profile(weights) => weights.get(option),
            WeightSource::Constant(weight) => Some(*weight),
        }
    }
}

/// Resolves option weights by trying each source in order; the first hit wins.
#[derive(Debug, Clone, Copy)]
pub struct WeightResolver<'a> {
    chain: [WeightSource<'a>; 3],
}

impl<'a> WeightResolver<'a> {
    /// Question scores, then `profile`, then zero.
    pub fn new(profile: &'a OptionWeights) -> Self {
        Self {
            chain: [
                WeightSource::QuestionScores,
                WeightSource::Profile(profile),
                WeightSource::Constant(0.0),
            ],
        }
    }

    pub fn weight_of(&self, question: &Question, option: &str) -> f64 {
        self.chain
            .iter()
            .find_map(|source| source.lookup(question, option))
            .unwrap_or(0.0)
    }

    /// Highest weight among the declared options, never below [`MIN_MAX_WEIGHT`].
    pub fn max_weight_of(&self, question: &Question) -> f64 {
        question
            .options
            .iter()
            .map(|option| self.weight_of(question, option))
            .fold(MIN_MAX_WEIGHT, f64::max)
    }
}

pub fn weight_of(question: &Question, option: &str, profile: &OptionWeights) -> f64 {
    WeightResolver::new(profile).weight_of(question, option)
}

pub fn max_weight_of(question: &Question, profile: &OptionWeights) -> f64 {
    WeightResolver::new(profile).max_weight_of(question)
}
