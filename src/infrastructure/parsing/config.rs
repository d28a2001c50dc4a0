//! Site profiles: per-site selector cascades and URL conventions
//!
//! Centralized configuration for CSS selectors and parsing behavior. Update the
//! built-in profiles when a site changes its markup; each cascade is tried in
//! declaration order so new selectors go first and old ones stay as fallbacks.

use serde::{Deserialize, Serialize};
use url::Url;

use super::cascade::{LocatorSpec, StrategySpec};
use super::price::{DecimalSeparator, PriceFormat};
use super::{ParsingError, ParsingResult};

/// Everything the core needs to know about one source site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Short identifier (`amazon`, `flipkart`)
    pub name: String,

    /// Base URL for resolving relative links
    pub base_url: String,

    /// Search URL with a `{query}` placeholder
    pub search_url_template: String,

    pub price_format: PriceFormat,

    pub listing: ListingSelectors,

    pub reviews: ReviewSelectors,
}

/// Selectors for search result listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selectors for result cards - multiple fallbacks
    pub containers: Vec<LocatorSpec>,
    pub title: Vec<StrategySpec>,
    pub price: Vec<StrategySpec>,
    pub link: Vec<StrategySpec>,
}

/// Selectors for review pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSelectors {
    /// Selectors for individual review blocks or titles
    pub units: Vec<LocatorSpec>,

    /// Selectors for the "next page" control
    pub next_page: Vec<LocatorSpec>,

    /// Path template with an `{id}` placeholder, used when the product link
    /// carries a `/dp/<id>` segment
    pub review_path_template: Option<String>,
}

impl SiteProfile {
    pub fn base(&self) -> ParsingResult<Url> {
        Url::parse(&self.base_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: self.base_url.clone(),
            reason: format!("Invalid base URL: {e}"),
            base_url: None,
        })
    }

    /// Build the search URL; spaces in the query become `+`.
    pub fn search_url(&self, query: &str) -> ParsingResult<Url> {
        let encoded = query.split_whitespace().collect::<Vec<_>>().join("+");
        let raw = self.search_url_template.replace("{query}", &encoded);
        Url::parse(&raw).map_err(|e| ParsingError::UrlResolutionFailed {
            url: raw,
            reason: format!("Invalid search URL: {e}"),
            base_url: Some(self.base_url.clone()),
        })
    }

    /// Where the reviews of `product` live.
    ///
    /// A `/dp/<id>` product link maps onto the review path template; any other
    /// link is assumed to host its reviews itself.
    pub fn review_url(&self, product: &Url) -> Url {
        let Some(template) = &self.reviews.review_path_template else {
            return product.clone();
        };

        let product_id = product
            .path()
            .split_once("/dp/")
            .and_then(|(_, rest)| rest.split('/').next())
            .filter(|id| !id.is_empty());

        match (product_id, self.base()) {
            (Some(id), Ok(base)) => base
                .join(&template.replace("{id}", id))
                .unwrap_or_else(|_| product.clone()),
            _ => product.clone(),
        }
    }

    pub fn amazon() -> Self {
        Self {
            name: "amazon".to_string(),
            base_url: "https://www.amazon.in".to_string(),
            search_url_template: "https://www.amazon.in/s?k={query}".to_string(),
            price_format: PriceFormat::new("INR", DecimalSeparator::Dot),
            listing: ListingSelectors {
                containers: vec![
                    "div[data-component-type='s-search-result']".into(),
                    "div.s-result-item".into(),
                    "div.sg-col-inner".into(),
                ],
                title: vec![
                    StrategySpec::text("h2 a.a-link-normal span"),
                    StrategySpec::text("h2 span.a-text-normal"),
                    StrategySpec::text("h2"),
                ],
                price: vec![
                    StrategySpec::text("span.a-price-whole"),
                    StrategySpec::text("span.a-price span[aria-hidden='true']"),
                    StrategySpec::text("span.a-price"),
                    StrategySpec::text("span.a-offscreen"),
                ],
                link: vec![
                    StrategySpec::attribute("h2 a", "href"),
                    StrategySpec::attribute("a.a-link-normal", "href"),
                ],
            },
            reviews: ReviewSelectors {
                units: vec![
                    "a[data-hook='review-title']".into(),
                    "span[data-hook='review-title']".into(),
                    ".review-title".into(),
                    ".a-size-base.review-title".into(),
                    "div[data-hook='review']".into(),
                    "div.review".into(),
                    "div.a-section.review".into(),
                ],
                next_page: vec![
                    "li.a-last a".into(),
                    "a[href*='pageNumber'][aria-label*='Next']".into(),
                    "a.a-link-normal[href*='pageNumber']".into(),
                ],
                review_path_template: Some("/product-reviews/{id}/".to_string()),
            },
        }
    }

    pub fn flipkart() -> Self {
        Self {
            name: "flipkart".to_string(),
            base_url: "https://www.flipkart.com".to_string(),
            search_url_template: "https://www.flipkart.com/search?q={query}".to_string(),
            price_format: PriceFormat::new("INR", DecimalSeparator::Dot),
            listing: ListingSelectors {
                containers: vec![
                    "div[data-id]".into(),
                    "div._1AtVbE".into(),
                    "div[class*='product']".into(),
                    LocatorSpec::ancestor("a[href*='/p/']", 2),
                ],
                title: vec![
                    StrategySpec::text("div._4rR01t"),
                    StrategySpec::text("div.KzDlHZ"),
                    StrategySpec::attribute("a[title]", "title"),
                ],
                price: vec![
                    StrategySpec::text("div._30jeq3"),
                    StrategySpec::text("div.Nx9bqj"),
                    StrategySpec::text_contains("div", "₹"),
                ],
                link: vec![StrategySpec::attribute("a[href*='/p/']", "href")],
            },
            reviews: ReviewSelectors {
                units: vec![
                    "p._2-N8zT".into(),
                    "div.z9E0IG".into(),
                    "div.t-ZTKy".into(),
                ],
                next_page: vec!["a._1LKTO3[rel='next']".into(), "a[rel='next']".into()],
                review_path_template: None,
            },
        }
    }

    /// Built-in profiles keyed by name
    pub fn builtin() -> Vec<Self> {
        vec![Self::amazon(), Self::flipkart()]
    }
}
