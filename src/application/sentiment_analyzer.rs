//! Sentiment classification and aggregation
//!
//! A [`PolarityScorer`] maps text to a score in `[-1, 1]`; the analyzer
//! buckets scores with [`SentimentThresholds`] and reduces the resulting
//! [`SentimentTally`] into a [`Decision`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{Decision, ReviewUnit, Sentiment, SentimentTally, SentimentThresholds};

/// Scores text polarity in `[-1, 1]`
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const NEGATION_FACTOR: f64 = -0.5;
const INTENSIFIER_FACTOR: f64 = 1.3;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("best", 1.0),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("love", 0.5),
    ("loved", 0.7),
    ("happy", 0.8),
    ("superb", 1.0),
    ("fantastic", 0.4),
    ("wonderful", 1.0),
    ("brilliant", 0.9),
    ("satisfied", 0.5),
    ("recommended", 0.5),
    ("worth", 0.3),
    ("smooth", 0.4),
    ("fast", 0.2),
    ("beautiful", 0.85),
    ("value", 0.2),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bad", -0.7),
    ("worst", -1.0),
    ("poor", -0.4),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("waste", -0.6),
    ("useless", -0.5),
    ("broken", -0.4),
    ("defective", -0.6),
    ("faulty", -0.5),
    ("fake", -0.5),
    ("hate", -0.8),
    ("slow", -0.3),
    ("overheating", -0.5),
    ("problem", -0.3),
    ("issue", -0.2),
    ("cheap", -0.2),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "won't",
    "can't", "cannot", "hardly", "nothing", "neither", "nor",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "extremely", "super", "so", "too", "highly", "absolutely", "totally",
];

/// Word-weight lexicon scorer.
///
/// A negator flips and dampens the next sentiment word (×-0.5); an intensifier
/// scales it (×1.3). The score is the mean over sentiment-bearing words.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    weights: HashMap<String, f64>,
    negators: HashSet<String>,
    intensifiers: HashSet<String>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            weights: POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS)
                .map(|(word, weight)| ((*word).to_string(), *weight))
                .collect(),
            negators: NEGATORS.iter().map(ToString::to_string).collect(),
            intensifiers: INTENSIFIERS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl LexiconScorer {
    /// Add or replace a word weight, clamped to `[-1, 1]`.
    pub fn with_word(mut self, word: &str, weight: f64) -> Self {
        self.weights.insert(word.to_lowercase(), weight.clamp(-1.0, 1.0));
        self
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .filter(|token| !token.is_empty())
        .map(|token| token.replace('’', "'").to_lowercase())
}

impl PolarityScorer for LexiconScorer {
    #[allow(clippy::cast_precision_loss)]
    fn polarity(&self, text: &str) -> f64 {
        let mut negated = false;
        let mut intensity = 1.0;
        let mut scores = Vec::new();

        for token in tokenize(text) {
            if self.negators.contains(&token) {
                negated = true;
                continue;
            }
            if self.intensifiers.contains(&token) {
                intensity *= INTENSIFIER_FACTOR;
                continue;
            }
            let Some(weight) = self.weights.get(&token) else {
                continue;
            };

            let mut score = weight * intensity;
            if negated {
                score *= NEGATION_FACTOR;
            }
            scores.push(score.clamp(-1.0, 1.0));
            negated = false;
            intensity = 1.0;
        }

        if scores.is_empty() {
            return 0.0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    }
}

/// Tally plus the decision it reduces to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentReport {
    pub tally: SentimentTally,
    pub decision: Decision,
}

/// Classifies review text and aggregates a decision
#[derive(Clone)]
pub struct SentimentAnalyzer {
    scorer: Arc<dyn PolarityScorer>,
    thresholds: SentimentThresholds,
}

impl std::fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(LexiconScorer::default()), SentimentThresholds::default())
    }
}

impl SentimentAnalyzer {
    pub fn new(scorer: Arc<dyn PolarityScorer>, thresholds: SentimentThresholds) -> Self {
        Self { scorer, thresholds }
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        let score = self.scorer.polarity(text);
        let sentiment = self.thresholds.bucket(score);
        debug!("{:?} ({:.3}): {}", sentiment, score, text);
        sentiment
    }

    pub fn tally(&self, units: &[ReviewUnit]) -> SentimentTally {
        units.iter().map(|unit| self.classify(&unit.text)).collect()
    }

    /// Pure reduction of `units` into a decision.
    pub fn aggregate(&self, units: &[ReviewUnit]) -> Decision {
        self.report(units).decision
    }

    pub fn report(&self, units: &[ReviewUnit]) -> SentimentReport {
        let tally = self.tally(units);
        let decision = Decision::from_tally(&tally);
        info!(
            "Sentiment: {} positive, {} neutral, {} negative → {:?} ({:.1}%)",
            tally.positive, tally.neutral, tally.negative, decision.verdict, decision.confidence_pct
        );
        SentimentReport { tally, decision }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;
    use rstest::rstest;

    /// Scores by a fixed table so aggregation can be checked in isolation.
    struct TableScorer(HashMap<&'static str, f64>);

    impl PolarityScorer for TableScorer {
        fn polarity(&self, text: &str) -> f64 {
            self.0.get(text).copied().unwrap_or(0.0)
        }
    }

    fn units(texts: &[&str]) -> Vec<ReviewUnit> {
        texts.iter().map(|t| ReviewUnit::new(*t, 1)).collect()
    }

    #[rstest]
    #[case("Excellent phone", Sentiment::Positive)]
    #[case("Worst purchase ever", Sentiment::Negative)]
    #[case("Arrived on Tuesday", Sentiment::Neutral)]
    #[case("Not good at all", Sentiment::Negative)]
    #[case("Not bad for the price", Sentiment::Positive)]
    #[case("Very good camera", Sentiment::Positive)]
    #[case("Totally useless, don’t buy", Sentiment::Negative)]
    fn lexicon_classification(#[case] text: &str, #[case] expected: Sentiment) {
        assert_eq!(SentimentAnalyzer::default().classify(text), expected);
    }

    #[test]
    fn intensifier_and_negation_factors() {
        let scorer = LexiconScorer::default();
        assert!((scorer.polarity("good") - 0.7).abs() < 1e-9);
        assert!((scorer.polarity("very good") - 0.91).abs() < 1e-9);
        assert!((scorer.polarity("not good") + 0.35).abs() < 1e-9);
        assert!((scorer.polarity("extremely very excellent") - 1.0).abs() < 1e-9);
        assert!(scorer.polarity("").abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_boundaries_are_neutral() {
        let table = HashMap::from([("edge+", 0.1), ("edge-", -0.1), ("above", 0.1001)]);
        let analyzer = SentimentAnalyzer::new(Arc::new(TableScorer(table)), SentimentThresholds::default());
        assert_eq!(analyzer.classify("edge+"), Sentiment::Neutral);
        assert_eq!(analyzer.classify("edge-"), Sentiment::Neutral);
        assert_eq!(analyzer.classify("above"), Sentiment::Positive);
    }

    #[test]
    fn aggregate_six_two_two_is_buy_at_75() {
        let table = HashMap::from([("p", 0.9), ("n", -0.9), ("z", 0.0)]);
        let analyzer = SentimentAnalyzer::new(Arc::new(TableScorer(table)), SentimentThresholds::default());
        let texts = ["p", "p", "p", "p", "p", "p", "n", "n", "z", "z"];

        let report = analyzer.report(&units(&texts));
        assert_eq!(report.tally, SentimentTally::new(6, 2, 2));
        assert_eq!(report.decision.verdict, Verdict::Buy);
        assert!((report.decision.confidence_pct - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_edge_cases() {
        let table = HashMap::from([("p", 0.9), ("n", -0.9)]);
        let analyzer = SentimentAnalyzer::new(Arc::new(TableScorer(table)), SentimentThresholds::default());

        let none = analyzer.aggregate(&units(&["meh", "ok"]));
        assert_eq!(none.verdict, Verdict::Neutral);
        assert!(none.confidence_pct.abs() < f64::EPSILON);

        let tie = analyzer.aggregate(&units(&["p", "n"]));
        assert_eq!(tie.verdict, Verdict::Neutral);
        assert!((tie.confidence_pct - 50.0).abs() < f64::EPSILON);

        let negative = analyzer.aggregate(&units(&["n", "n", "p"]));
        assert_eq!(negative.verdict, Verdict::DontBuy);
        assert!((negative.confidence_pct - 200.0 / 3.0).abs() < 1e-9);
    }
}
