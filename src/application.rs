//! Application layer module
//!
//! Use cases that orchestrate extraction, review collection and the
//! sentiment decision on top of the infrastructure components.

pub mod price_comparison;
pub mod sentiment_analyzer;
pub mod verdict_pipeline;

pub use price_comparison::{PriceComparison, SiteLowest};
pub use sentiment_analyzer::{LexiconScorer, PolarityScorer, SentimentAnalyzer, SentimentReport};
pub use verdict_pipeline::{
    PipelineOutcome, PipelineReport, ReviewCollection, VerdictPipeline, VerdictSummary,
};
