//! Verdict pipeline: search listing → cheapest record → reviews → decision
//!
//! One run per (site, query). Runs share nothing mutable, so independent runs
//! may execute concurrently over the same [`PageSource`].

use std::sync::Arc;

use scraper::Html;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use super::sentiment_analyzer::{LexiconScorer, SentimentAnalyzer, SentimentReport};
use crate::domain::{lowest_priced, Decision, Recommendation, Record, ReviewUnit, SentimentTally};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::fetch_retry::{fetch_with_retry, FetchAttempt, FetchOutcome, RetryPolicy};
use crate::infrastructure::page_source::{LinkedReviewCursor, PageSource};
use crate::infrastructure::pagination::{walk, StopReason, WalkSettings};
use crate::infrastructure::parsing::{
    ContextualParser, ListingExtraction, ListingParser, ParseContext, ParsingResult,
    ReviewPageParser, SiteProfile,
};

/// Reviews gathered for the chosen record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCollection {
    pub review_url: Url,
    pub pages_walked: u32,
    /// `None` when the first review page could not be fetched
    pub stop_reason: Option<StopReason>,
    pub error: Option<String>,
    pub units: Vec<ReviewUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictSummary {
    pub listing: ListingExtraction,
    pub chosen: Record,
    pub reviews: ReviewCollection,
    pub tally: SentimentTally,
    pub decision: Decision,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The search listing never produced an acceptable document
    NoListing {
        reason: String,
        attempts: Vec<FetchAttempt>,
    },
    /// Listing parsed, but no record carries an available price
    NoPricedRecord { listing: ListingExtraction },
    Cancelled { listing: Option<ListingExtraction> },
    Completed(Box<VerdictSummary>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub site: String,
    pub query: String,
    pub outcome: PipelineOutcome,
}

impl PipelineReport {
    /// Records extracted from the listing, empty when none was fetched
    pub fn records(&self) -> &[Record] {
        match &self.outcome {
            PipelineOutcome::NoPricedRecord { listing }
            | PipelineOutcome::Cancelled {
                listing: Some(listing),
            } => &listing.records,
            PipelineOutcome::Completed(summary) => &summary.listing.records,
            PipelineOutcome::NoListing { .. } | PipelineOutcome::Cancelled { listing: None } => &[],
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match &self.outcome {
            PipelineOutcome::Completed(summary) => Some(&summary.decision),
            _ => None,
        }
    }
}

pub struct VerdictPipeline<S: ?Sized> {
    source: Arc<S>,
    profile: SiteProfile,
    listing_parser: ListingParser,
    review_parser: ReviewPageParser,
    analyzer: SentimentAnalyzer,
    retry: RetryPolicy,
    walk: WalkSettings,
    listing_limit: usize,
}

impl<S> VerdictPipeline<S>
where
    S: PageSource + ?Sized,
{
    pub fn new(source: Arc<S>, profile: SiteProfile, config: &AppConfig) -> ParsingResult<Self> {
        Ok(Self {
            listing_parser: ListingParser::from_profile(&profile)?,
            review_parser: ReviewPageParser::from_profile(&profile, config.extraction.min_review_chars)?,
            analyzer: SentimentAnalyzer::new(
                Arc::new(LexiconScorer::default()),
                config.sentiment.thresholds(),
            ),
            retry: config.retry.clone(),
            walk: config.pagination.walk_settings(),
            listing_limit: config.extraction.listing_limit,
            source,
            profile,
        })
    }

    /// Replace the sentiment analyzer (custom scorer or thresholds).
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: SentimentAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn site(&self) -> &str {
        &self.profile.name
    }

    pub async fn run(&self, query: &str, cancel: &CancellationToken) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("verdict_run", %run_id, site = %self.profile.name);

        let outcome = self.run_inner(query, cancel).instrument(span).await;

        PipelineReport {
            run_id,
            site: self.profile.name.clone(),
            query: query.to_string(),
            outcome,
        }
    }

    async fn run_inner(&self, query: &str, cancel: &CancellationToken) -> PipelineOutcome {
        info!("🔍 Searching '{}'", query);

        let search_url = match self.profile.search_url(query) {
            Ok(url) => url,
            Err(e) => {
                return PipelineOutcome::NoListing {
                    reason: e.to_string(),
                    attempts: Vec::new(),
                };
            }
        };

        let source = self.source.as_ref();
        let fetched = fetch_with_retry(
            |_| source.fetch(&search_url),
            |html: &String| {
                let document = Html::parse_document(html);
                self.listing_parser.has_candidates(&document.root_element())
            },
            &self.retry,
            cancel,
        )
        .await;

        let listing_html = match fetched {
            FetchOutcome::Accepted { document, .. } => document,
            FetchOutcome::Cancelled { .. } => return PipelineOutcome::Cancelled { listing: None },
            FetchOutcome::Exhausted { attempts } => {
                warn!("❌ No usable listing after {} attempts", attempts.len());
                return PipelineOutcome::NoListing {
                    reason: "retries exhausted".to_string(),
                    attempts,
                };
            }
            FetchOutcome::Failed { error, attempts } => {
                warn!("❌ Listing unavailable: {}", error);
                return PipelineOutcome::NoListing {
                    reason: error.to_string(),
                    attempts,
                };
            }
        };

        let listing = {
            let document = Html::parse_document(&listing_html);
            self.listing_parser
                .parse_with_context(&document, &ParseContext::default().with_limit(self.listing_limit))
        };

        let Some(chosen) = lowest_priced(&listing.records).cloned() else {
            warn!("No priced record among {} records", listing.records.len());
            return PipelineOutcome::NoPricedRecord { listing };
        };
        info!("💰 Lowest price: {} ({:?})", chosen.title, chosen.price);

        let reviews = self.collect_reviews(&chosen, cancel).await;
        if reviews.stop_reason == Some(StopReason::Cancelled) && reviews.units.is_empty() {
            return PipelineOutcome::Cancelled {
                listing: Some(listing),
            };
        }

        let SentimentReport { tally, decision } = if reviews.units.is_empty() {
            SentimentReport {
                tally: SentimentTally::default(),
                decision: Decision::inconclusive(),
            }
        } else {
            self.analyzer.report(&reviews.units)
        };

        info!(
            "🎯 Verdict {:?} ({:.1}%) from {} reviews",
            decision.verdict,
            decision.confidence_pct,
            reviews.units.len()
        );

        PipelineOutcome::Completed(Box::new(VerdictSummary {
            listing,
            chosen,
            reviews,
            tally,
            recommendation: decision.recommendation(),
            decision,
        }))
    }

    async fn collect_reviews(&self, chosen: &Record, cancel: &CancellationToken) -> ReviewCollection {
        let review_url = self.profile.review_url(&chosen.link);
        let mut collection = ReviewCollection {
            review_url: review_url.clone(),
            pages_walked: 0,
            stop_reason: None,
            error: None,
            units: Vec::new(),
        };

        let source = self.source.as_ref();
        let first_page = fetch_with_retry(
            |_| source.fetch(&review_url),
            |html: &String| !html.trim().is_empty(),
            &self.retry,
            cancel,
        )
        .await;

        let first_html = match first_page {
            FetchOutcome::Accepted { document, .. } => document,
            FetchOutcome::Cancelled { .. } => {
                collection.stop_reason = Some(StopReason::Cancelled);
                return collection;
            }
            FetchOutcome::Exhausted { attempts } => {
                collection.error = Some(format!("review page unavailable after {} attempts", attempts.len()));
                return collection;
            }
            FetchOutcome::Failed { error, .. } => {
                collection.error = Some(error.to_string());
                return collection;
            }
        };

        let mut cursor =
            LinkedReviewCursor::new(source, &self.review_parser, &self.retry, cancel, &first_html);
        let walked = walk(&mut cursor, &self.walk, cancel).await;

        collection.pages_walked = walked.pages_walked;
        collection.stop_reason = Some(walked.stop_reason);
        collection.units = walked.units;
        collection
    }
}
