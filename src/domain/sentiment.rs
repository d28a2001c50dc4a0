//! Sentiment value objects and the tally-to-decision reduction

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Polarity cut-offs used to bucket a score into a [`Sentiment`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentThresholds {
    /// Scores strictly above this are positive
    pub positive: f64,
    /// Scores strictly below this are negative
    pub negative: f64,
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            positive: 0.1,
            negative: -0.1,
        }
    }
}

impl SentimentThresholds {
    pub fn bucket(&self, score: f64) -> Sentiment {
        if score > self.positive {
            Sentiment::Positive
        } else if score < self.negative {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Running classification counts; only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentTally {
    pub const fn new(positive: u32, neutral: u32, negative: u32) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }

    pub const fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub const fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    /// Units that carry an opinion; neutral ones are reported but not counted.
    pub const fn decision_base(&self) -> u32 {
        self.positive + self.negative
    }
}

impl FromIterator<Sentiment> for SentimentTally {
    fn from_iter<I: IntoIterator<Item = Sentiment>>(iter: I) -> Self {
        let mut tally = Self::default();
        for sentiment in iter {
            tally.record(sentiment);
        }
        tally
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Buy,
    DontBuy,
    Neutral,
    /// No review content was available to decide on
    Inconclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    #[serde(rename = "confidencePct")]
    pub confidence_pct: f64,
}

impl Decision {
    /// Reduce a finalised tally into a verdict.
    #[allow(clippy::cast_lossless)]
    pub fn from_tally(tally: &SentimentTally) -> Self {
        let base = tally.decision_base();
        if base == 0 {
            return Self {
                verdict: Verdict::Neutral,
                confidence_pct: 0.0,
            };
        }

        let pct = |count: u32| f64::from(count) / f64::from(base) * 100.0;
        match tally.positive.cmp(&tally.negative) {
            std::cmp::Ordering::Greater => Self {
                verdict: Verdict::Buy,
                confidence_pct: pct(tally.positive),
            },
            std::cmp::Ordering::Less => Self {
                verdict: Verdict::DontBuy,
                confidence_pct: pct(tally.negative),
            },
            std::cmp::Ordering::Equal => Self {
                verdict: Verdict::Neutral,
                confidence_pct: 50.0,
            },
        }
    }

    pub const fn inconclusive() -> Self {
        Self {
            verdict: Verdict::Inconclusive,
            confidence_pct: 0.0,
        }
    }

    pub const fn recommendation(&self) -> Recommendation {
        match self.verdict {
            Verdict::Buy => Recommendation::Yes,
            Verdict::DontBuy => Recommendation::No,
            Verdict::Neutral | Verdict::Inconclusive => Recommendation::Maybe,
        }
    }
}

/// Coarse buy advice derived from a [`Decision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Yes,
    No,
    Maybe,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_positive_is_buy() {
        let decision = Decision::from_tally(&SentimentTally::new(6, 2, 2));
        assert_eq!(decision.verdict, Verdict::Buy);
        assert!((decision.confidence_pct - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn majority_negative_is_dont_buy() {
        let decision = Decision::from_tally(&SentimentTally::new(1, 5, 3));
        assert_eq!(decision.verdict, Verdict::DontBuy);
        assert!((decision.confidence_pct - 75.0).abs() < f64::EPSILON);
        assert_eq!(decision.recommendation(), Recommendation::No);
    }

    #[test]
    fn tie_is_neutral_at_fifty() {
        let decision = Decision::from_tally(&SentimentTally::new(3, 0, 3));
        assert_eq!(decision.verdict, Verdict::Neutral);
        assert!((decision.confidence_pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn neutral_only_is_neutral_at_zero() {
        let decision = Decision::from_tally(&SentimentTally::new(0, 4, 0));
        assert_eq!(decision.verdict, Verdict::Neutral);
        assert_eq!(decision.confidence_pct, 0.0);
    }

    #[test]
    fn thresholds_are_strict() {
        let thresholds = SentimentThresholds::default();
        assert_eq!(thresholds.bucket(0.1), Sentiment::Neutral);
        assert_eq!(thresholds.bucket(0.11), Sentiment::Positive);
        assert_eq!(thresholds.bucket(-0.1), Sentiment::Neutral);
        assert_eq!(thresholds.bucket(-0.5), Sentiment::Negative);
    }
}
