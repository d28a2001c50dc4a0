//! Domain module - listing records, review units and sentiment value objects
//!
//! Everything here is plain data plus pure reductions; no I/O.

pub mod money;
pub mod record;
pub mod review;
pub mod sentiment;

pub use money::Money;
pub use record::{lowest_priced, Price, Record};
pub use review::{normalize_review_text, ReviewUnit};
pub use sentiment::{
    Decision, Recommendation, Sentiment, SentimentTally, SentimentThresholds, Verdict,
};
