//! Parsing and fetch error types
//!
//! Field-level misses are not errors (see `FieldValue::NotFound`); these
//! variants cover bad selectors, dropped records and fetch failures.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No usable strategy compiled for '{field}'")]
    NoStrategies { field: String, errors: Vec<String> },

    #[error("No candidate containers found (tried: {})", .tried_strategies.join(", "))]
    NoCandidates { tried_strategies: Vec<String> },

    #[error("Malformed record at rank {rank}: {reason}")]
    MalformedRecord { rank: usize, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Transient fetch failure for {url}: {reason}")]
    TransientFetch { url: String, reason: String },

    #[error("Page not available: {url}")]
    PageNotFound { url: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_record(rank: usize, reason: &str) -> Self {
        Self::MalformedRecord {
            rank,
            reason: reason.to_string(),
        }
    }

    pub fn transient_fetch(url: &str, reason: &str) -> Self {
        Self::TransientFetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the same operation may succeed
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::TransientFetch { .. } | Self::MalformedRecord { .. } => true,
            Self::InvalidSelector { .. }
            | Self::NoStrategies { .. }
            | Self::NoCandidates { .. }
            | Self::UrlResolutionFailed { .. }
            | Self::PageNotFound { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
