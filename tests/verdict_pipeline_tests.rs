//! End-to-end runs over the HTML fixtures in `tests/fixtures`
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use price_verdict_lib::application::{PipelineOutcome, PriceComparison, VerdictPipeline, VerdictSummary};
use price_verdict_lib::domain::{Money, Recommendation, SentimentTally, Verdict};
use price_verdict_lib::infrastructure::{AppConfig, FixturePageSource, RetryPolicy, SiteProfile, StopReason};
use tokio_util::sync::CancellationToken;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.retry = RetryPolicy::new(3, 0, 0);
    config.pagination.max_pages = 5;
    config.pagination.settle_delay_ms = 0;
    config
}

async fn pipeline(profile: SiteProfile) -> VerdictPipeline<FixturePageSource> {
    let source = FixturePageSource::open(fixtures_dir()).await.unwrap();
    VerdictPipeline::new(Arc::new(source), profile, &test_config()).unwrap()
}

fn completed(outcome: PipelineOutcome) -> Box<VerdictSummary> {
    match outcome {
        PipelineOutcome::Completed(summary) => summary,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

#[tokio::test]
async fn amazon_run_walks_two_review_pages_and_recommends_buying() {
    let report = pipeline(SiteProfile::amazon())
        .await
        .run("redmi note 13", &CancellationToken::new())
        .await;
    assert_eq!(report.site, "amazon");
    let summary = completed(report.outcome);

    // the sponsored block has no link and is dropped
    assert_eq!(summary.listing.candidates, 4);
    assert_eq!(summary.listing.dropped, 1);
    assert_eq!(summary.listing.records.len(), 3);
    assert!(!summary.listing.records[2].price.is_available());

    assert_eq!(summary.chosen.title, "Redmi Note 13 5G (6GB RAM, 128GB)");
    assert_eq!(summary.chosen.source_rank, 1);
    assert_eq!(summary.chosen.price.money().unwrap().to_string(), "16499");

    assert_eq!(
        summary.reviews.review_url.as_str(),
        "https://www.amazon.in/product-reviews/B0CQ1HX9K2/"
    );
    assert_eq!(summary.reviews.pages_walked, 2);
    assert_eq!(summary.reviews.stop_reason, Some(StopReason::NoNextPage));

    let texts: Vec<&str> = summary.reviews.units.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Excellent display and smooth performance",
            "Battery life is great",
            "Camera is terrible in low light",
            "Value for money, highly recommended",
            "Arrived on time",
        ]
    );
    assert_eq!(summary.reviews.units[3].page_number, 2);

    assert_eq!(summary.tally, SentimentTally::new(3, 1, 1));
    assert_eq!(summary.decision.verdict, Verdict::Buy);
    assert!((summary.decision.confidence_pct - 75.0).abs() < f64::EPSILON);
    assert_eq!(summary.recommendation, Recommendation::Yes);
}

#[tokio::test]
async fn page_limit_caps_the_review_walk() {
    let source = FixturePageSource::open(fixtures_dir()).await.unwrap();
    let mut config = test_config();
    config.pagination.max_pages = 1;
    let pipeline = VerdictPipeline::new(Arc::new(source), SiteProfile::amazon(), &config).unwrap();

    let summary = completed(pipeline.run("redmi note 13", &CancellationToken::new()).await.outcome);
    assert_eq!(summary.reviews.pages_walked, 1);
    assert_eq!(summary.reviews.stop_reason, Some(StopReason::PageLimit));
    assert_eq!(summary.reviews.units.len(), 3);
}

#[tokio::test]
async fn flipkart_run_reads_reviews_from_the_product_page() {
    let report = pipeline(SiteProfile::flipkart())
        .await
        .run("redmi note 13", &CancellationToken::new())
        .await;
    let summary = completed(report.outcome);

    assert_eq!(summary.listing.records.len(), 2);
    assert_eq!(summary.listing.dropped, 1);
    assert_eq!(
        summary.chosen.link.as_str(),
        "https://www.flipkart.com/redmi-note-13-5g/p/itm7f2c1d?pid=MOBGTAGP"
    );
    assert_eq!(summary.reviews.review_url, summary.chosen.link);
    assert_eq!(summary.reviews.pages_walked, 1);
    assert_eq!(summary.reviews.stop_reason, Some(StopReason::NoNextPage));

    // "Good" is too short to count
    assert_eq!(summary.tally, SentimentTally::new(1, 0, 2));
    assert_eq!(summary.decision.verdict, Verdict::DontBuy);
    assert_eq!(summary.recommendation, Recommendation::No);
}

#[tokio::test]
async fn listing_without_result_cards_exhausts_retries() {
    let report = pipeline(SiteProfile::amazon())
        .await
        .run("unknown gadget", &CancellationToken::new())
        .await;

    let PipelineOutcome::NoListing { attempts, .. } = &report.outcome else {
        panic!("expected no listing, got {:?}", report.outcome);
    };
    assert_eq!(attempts.len(), 3);
    assert!(report.records().is_empty());
    assert!(report.decision().is_none());
}

#[tokio::test]
async fn unknown_search_page_fails_without_retrying() {
    let report = pipeline(SiteProfile::amazon())
        .await
        .run("missing page", &CancellationToken::new())
        .await;

    let PipelineOutcome::NoListing { attempts, reason } = &report.outcome else {
        panic!("expected no listing, got {:?}", report.outcome);
    };
    assert_eq!(attempts.len(), 1);
    assert!(reason.contains("missing+page"));
}

#[tokio::test]
async fn cancelled_run_fetches_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = pipeline(SiteProfile::amazon()).await.run("redmi note 13", &cancel).await;
    assert_eq!(report.outcome, PipelineOutcome::Cancelled { listing: None });
}

#[tokio::test]
async fn concurrent_site_runs_feed_the_price_comparison() {
    let source = Arc::new(FixturePageSource::open(fixtures_dir()).await.unwrap());
    let config = test_config();
    let cancel = CancellationToken::new();

    let amazon = VerdictPipeline::new(Arc::clone(&source), SiteProfile::amazon(), &config).unwrap();
    let flipkart = VerdictPipeline::new(Arc::clone(&source), SiteProfile::flipkart(), &config).unwrap();

    let (a, f) = tokio::join!(
        amazon.run("redmi note 13", &cancel),
        flipkart.run("redmi note 13", &cancel)
    );
    assert_ne!(a.run_id, f.run_id);

    let comparison = PriceComparison::from_listings([
        (a.site.as_str(), a.records()),
        (f.site.as_str(), f.records()),
    ])
    .unwrap();

    assert_eq!(comparison.cheaper_site, "amazon");
    let expected = Money::from_decimal_str("1500", "INR").unwrap();
    assert_eq!(comparison.savings.compare_amount(&expected), Some(Ordering::Equal));
}

#[test]
fn sample_configuration_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("price_verdict.toml");
    let config = AppConfig::load(Some(path.as_path())).unwrap();

    assert_eq!(config.retry, RetryPolicy::default());
    assert_eq!(config.pagination.max_pages, 2);
    assert!(config.site("amazon").is_some());
    assert!(config.site("flipkart").is_some());
}
