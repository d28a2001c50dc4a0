//! Price Verdict - resilient listing extraction and review sentiment decisions
//!
//! Turns search listings and review pages into normalized records, picks the
//! cheapest offer and reduces its reviews into a buy / don't buy decision.
//! Documents are supplied by a [`PageSource`](infrastructure::PageSource);
//! the core owns no transport.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{PipelineOutcome, PipelineReport, PriceComparison, VerdictPipeline};
pub use domain::{Decision, Record, ReviewUnit, Verdict};
