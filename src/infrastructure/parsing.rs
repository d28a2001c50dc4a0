//! HTML parsing infrastructure
//!
//! Trait-based extraction over [`DomNode`](crate::infrastructure::dom::DomNode):
//! selector cascades, listing records, review units and price normalisation.
//! Markup drift is expected; every lookup is a cascade with explicit fallbacks.

pub mod cascade;
pub mod config;
pub mod context;
pub mod error;
pub mod price;
pub mod record_extractor;
pub mod review_extractor;

// Re-export public types
pub use cascade::{
    locate_first, resolve, ExtractionStrategy, FieldValue, Located, Locator, LocatorSpec, Strategy,
    StrategySpec,
};
pub use config::{ListingSelectors, ReviewSelectors, SiteProfile};
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use price::{normalize_price, DecimalSeparator, PriceFormat};
pub use record_extractor::{extract_records, FieldStrategies, ListingExtraction, ListingParser};
pub use review_extractor::{NextPage, ReviewPage, ReviewPageParser};

use scraper::Html;

/// Parser that needs per-pass context (page number, candidate limit)
pub trait ContextualParser {
    type Output;

    /// Parse a whole document with contextual information
    fn parse_with_context(&self, html: &Html, context: &ParseContext) -> Self::Output;
}

impl ContextualParser for ListingParser {
    type Output = ListingExtraction;

    fn parse_with_context(&self, html: &Html, context: &ParseContext) -> ListingExtraction {
        self.extract(&html.root_element(), context.limit)
    }
}

impl ContextualParser for ReviewPageParser {
    type Output = ReviewPage;

    fn parse_with_context(&self, html: &Html, context: &ParseContext) -> ReviewPage {
        let root = html.root_element();
        ReviewPage {
            units: self.extract_units(&root, context.page_number),
            next: self.next_page(&root),
        }
    }
}
