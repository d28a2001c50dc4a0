//! Listing record extraction
//!
//! Robust parsing of search result pages: locate result cards through a
//! container cascade, then resolve title, price and link independently per
//! card. Cards missing a title or link are dropped and counted, never raised.

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::cascade::{locate_first, resolve, ExtractionStrategy, FieldValue, Locator, Strategy};
use super::config::SiteProfile;
use super::price::{normalize_price, PriceFormat};
use super::{ParsingError, ParsingResult};
use crate::domain::{Price, Record};
use crate::infrastructure::dom::DomNode;

/// Ordered strategies for each record field
#[derive(Debug, Clone)]
pub struct FieldStrategies<S> {
    pub title: Vec<S>,
    pub price: Vec<S>,
    pub link: Vec<S>,
}

/// Result of one extraction pass over a listing document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingExtraction {
    /// Valid records in source rank order
    pub records: Vec<Record>,
    /// Candidates examined (bounded by the limit)
    pub candidates: usize,
    /// Candidates dropped as malformed
    pub dropped: usize,
    /// Container selector that produced the candidates
    pub container_strategy: Option<String>,
}

/// Resolve a possibly relative link against the site base.
pub fn resolve_link(raw: &str, base: &Url) -> ParsingResult<Url> {
    let resolved = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(raw).map_err(|e| ParsingError::UrlResolutionFailed {
                url: raw.to_string(),
                reason: format!("Failed to join URL: {e}"),
                base_url: Some(base.to_string()),
            })?
        }
        Err(e) => {
            return Err(ParsingError::UrlResolutionFailed {
                url: raw.to_string(),
                reason: e.to_string(),
                base_url: Some(base.to_string()),
            });
        }
    };

    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(ParsingError::UrlResolutionFailed {
            url: raw.to_string(),
            reason: format!("Unsupported scheme '{}'", resolved.scheme()),
            base_url: Some(base.to_string()),
        });
    }

    Ok(resolved)
}

fn build_record<N, S>(
    card: &N,
    rank: usize,
    fields: &FieldStrategies<S>,
    base: &Url,
    format: &PriceFormat,
) -> ParsingResult<Record>
where
    N: DomNode,
    S: ExtractionStrategy<N>,
{
    let title = resolve(card, &fields.title)
        .into_value()
        .ok_or_else(|| ParsingError::malformed_record(rank, "title not found"))?;

    let raw_link = resolve(card, &fields.link)
        .into_value()
        .ok_or_else(|| ParsingError::malformed_record(rank, "link not found"))?;
    let link = resolve_link(&raw_link, base)
        .map_err(|e| ParsingError::malformed_record(rank, &e.to_string()))?;

    let price = match resolve(card, &fields.price) {
        FieldValue::Found { value, .. } => normalize_price(&value, format),
        FieldValue::NotFound => Price::Unavailable,
    };

    Ok(Record {
        title,
        price,
        link,
        source_rank: rank,
    })
}

/// Extract up to `limit` records from `document`.
///
/// Candidates come from the first container locator with at least one match;
/// `rank` is the candidate's position in that list, so dropped candidates
/// leave gaps rather than shifting later ranks.
pub fn extract_records<N, S>(
    document: &N,
    card_locators: &[Locator],
    fields: &FieldStrategies<S>,
    limit: usize,
    base: &Url,
    format: &PriceFormat,
) -> ListingExtraction
where
    N: DomNode,
    S: ExtractionStrategy<N>,
{
    let located = locate_first(document, card_locators);
    if located.is_empty() {
        debug!("{}", ParsingError::NoCandidates { tried_strategies: located.tried });
        return ListingExtraction::default();
    }

    let mut extraction = ListingExtraction {
        container_strategy: located.strategy,
        ..ListingExtraction::default()
    };

    for (rank, card) in located.nodes.iter().take(limit).enumerate() {
        extraction.candidates += 1;
        match build_record(card, rank, fields, base, format) {
            Ok(record) => extraction.records.push(record),
            Err(e) => {
                debug!("Dropping candidate: {}", e);
                extraction.dropped += 1;
            }
        }
    }

    if extraction.dropped > 0 {
        warn!(
            "Dropped {} of {} candidates as malformed",
            extraction.dropped, extraction.candidates
        );
    }
    debug!(
        "Extracted {} records using {:?}",
        extraction.records.len(),
        extraction.container_strategy
    );

    extraction
}

/// Parser for search listings of one site
#[derive(Debug, Clone)]
pub struct ListingParser {
    container_locators: Vec<Locator>,
    fields: FieldStrategies<Strategy>,
    base_url: Url,
    price_format: PriceFormat,
}

impl ListingParser {
    /// Create parser from a site profile's selector configuration
    pub fn from_profile(profile: &SiteProfile) -> ParsingResult<Self> {
        let selectors = &profile.listing;
        Ok(Self {
            container_locators: Locator::compile_all("container", &selectors.containers)?,
            fields: FieldStrategies {
                title: Strategy::compile_all("title", &selectors.title)?,
                price: Strategy::compile_all("price", &selectors.price)?,
                link: Strategy::compile_all("link", &selectors.link)?,
            },
            base_url: profile.base()?,
            price_format: profile.price_format.clone(),
        })
    }

    pub fn extract<N: DomNode>(&self, document: &N, limit: usize) -> ListingExtraction {
        extract_records(
            document,
            &self.container_locators,
            &self.fields,
            limit,
            &self.base_url,
            &self.price_format,
        )
    }

    /// Acceptance check for fetched listings: at least one candidate card.
    pub fn has_candidates<N: DomNode>(&self, document: &N) -> bool {
        !locate_first(document, &self.container_locators).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::document_root;
    use scraper::Html;

    const LISTING: &str = r#"
        <html><body>
          <div data-component-type="s-search-result">
            <h2><a class="a-link-normal" href="/Phone-A/dp/A1/ref=1"><span>Phone A</span></a></h2>
            <span class="a-price"><span class="a-price-whole">1,23,456.</span></span>
          </div>
          <div data-component-type="s-search-result">
            <h2>No link here</h2>
            <span class="a-price-whole">999</span>
          </div>
          <div data-component-type="s-search-result">
            <h2><a class="a-link-normal" href="https://www.amazon.in/Phone-C/dp/C3"><span>Phone C</span></a></h2>
            <span class="a-color-secondary">Currently unavailable</span>
          </div>
          <div data-component-type="s-search-result">
            <h2><a class="a-link-normal" href="/Phone-D/dp/D4"><span>Phone D</span></a></h2>
            <span class="a-price-whole">450</span>
          </div>
        </body></html>"#;

    fn parser() -> ListingParser {
        ListingParser::from_profile(&SiteProfile::amazon()).unwrap()
    }

    #[test]
    fn drops_card_without_link_and_keeps_the_rest() {
        let doc = Html::parse_document(LISTING);
        let extraction = parser().extract(&document_root(&doc), 10);

        assert_eq!(extraction.candidates, 4);
        assert_eq!(extraction.dropped, 1);
        let ranks: Vec<usize> = extraction.records.iter().map(|r| r.source_rank).collect();
        assert_eq!(ranks, vec![0, 2, 3]);
        assert_eq!(
            extraction.container_strategy.as_deref(),
            Some("div[data-component-type='s-search-result']")
        );
    }

    #[test]
    fn normalizes_price_and_link() {
        let doc = Html::parse_document(LISTING);
        let extraction = parser().extract(&document_root(&doc), 10);

        let first = &extraction.records[0];
        assert_eq!(first.title, "Phone A");
        assert_eq!(first.link.as_str(), "https://www.amazon.in/Phone-A/dp/A1/ref=1");
        assert_eq!(first.price.money().unwrap().to_string(), "123456");

        let unpriced = &extraction.records[1];
        assert_eq!(unpriced.price, Price::Unavailable);
        assert_eq!(unpriced.link.as_str(), "https://www.amazon.in/Phone-C/dp/C3");
    }

    #[test]
    fn limit_bounds_candidates() {
        let doc = Html::parse_document(LISTING);
        let extraction = parser().extract(&document_root(&doc), 2);
        assert_eq!(extraction.candidates, 2);
        assert_eq!(extraction.records.len(), 1);
    }

    #[test]
    fn no_candidates_is_an_empty_pass() {
        let doc = Html::parse_document("<html><body><p>captcha</p></body></html>");
        let p = parser();
        assert!(!p.has_candidates(&document_root(&doc)));
        let extraction = p.extract(&document_root(&doc), 5);
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.container_strategy, None);
    }

    #[test]
    fn flipkart_fallback_price_skips_the_title_row() {
        let html = r#"<html><body><div data-id="MOB1">
                <a href="/apple-iphone-15/p/itm1"><div class="row">
                  <div class="KzDlHZ">Apple iPhone 15 (Black, 128 GB)</div>
                  <div class="pr">₹65,999</div>
                </div></a>
            </div></body></html>"#;
        let doc = Html::parse_document(html);
        let parser = ListingParser::from_profile(&SiteProfile::flipkart()).unwrap();
        let extraction = parser.extract(&document_root(&doc), 5);

        let record = &extraction.records[0];
        assert_eq!(record.title, "Apple iPhone 15 (Black, 128 GB)");
        assert_eq!(record.price.money().unwrap().to_string(), "65999");
    }

    #[test]
    fn flipkart_cards_found_from_product_link_grandparents() {
        let html = r#"<html><body><div class="grid">
                <div class="cell"><div class="inner"><a href="/phone-a/p/itm1">
                  <div class="KzDlHZ">Phone A</div><div class="Nx9bqj">₹9,999</div>
                </a></div></div>
                <div class="cell"><div class="inner"><a href="/phone-b/p/itm2">
                  <div class="KzDlHZ">Phone B</div><div class="Nx9bqj">₹12,499</div>
                </a></div></div>
            </div></body></html>"#;
        let doc = Html::parse_document(html);
        let parser = ListingParser::from_profile(&SiteProfile::flipkart()).unwrap();
        let extraction = parser.extract(&document_root(&doc), 5);

        assert_eq!(extraction.container_strategy.as_deref(), Some("a[href*='/p/'] ^2"));
        assert_eq!(extraction.candidates, 2);
        let titles: Vec<&str> = extraction.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Phone A", "Phone B"]);
        assert_eq!(
            extraction.records[1].link.as_str(),
            "https://www.flipkart.com/phone-b/p/itm2"
        );
    }

    #[test]
    fn link_resolution() {
        let base = Url::parse("https://example.com").unwrap();
        assert_eq!(
            resolve_link("/product/123", &base).unwrap().as_str(),
            "https://example.com/product/123"
        );
        assert_eq!(
            resolve_link("https://other.com/test", &base).unwrap().as_str(),
            "https://other.com/test"
        );
        assert_eq!(
            resolve_link("relative/path", &base).unwrap().as_str(),
            "https://example.com/relative/path"
        );
        assert!(resolve_link("javascript:void(0)", &base).is_err());
    }
}
