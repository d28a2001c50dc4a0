//! Infrastructure layer for parsing, fetching, pagination and configuration
//!
//! Everything that touches documents, time or the environment lives here;
//! the domain layer stays pure.

pub mod config; // Layered configuration and site profiles
pub mod dom;
pub mod fetch_retry;
pub mod logging; // Logging infrastructure
pub mod page_source;
pub mod pagination;
pub mod parsing; // Selector cascades and extractors
pub mod parsing_error; // Typed parsing and fetch errors

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, ConfigManager, LoggingConfig};
pub use dom::{document_root, DomNode};
pub use fetch_retry::{fetch_with_retry, AttemptOutcome, FetchAttempt, FetchOutcome, RetryPolicy};
pub use logging::{get_log_directory, init_logging_with_config};
pub use page_source::{FixturePageSource, LinkedReviewCursor, PageSource};
pub use pagination::{walk, PageCursor, ReviewAccumulator, StopReason, WalkOutcome, WalkSettings};
pub use parsing::{ListingParser, ParsingError, ParsingResult, ReviewPageParser, SiteProfile};
