//! Listing and review extraction throughput
//!
//! Cascades fall through to later strategies on drifted markup, so the
//! "fallback" cases measure the cost of missing the primary selectors.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scraper::Html;

use price_verdict_lib::infrastructure::dom::document_root;
use price_verdict_lib::infrastructure::parsing::{
    normalize_price, ListingParser, PriceFormat, ReviewPageParser, SiteProfile,
};

fn listing_html(cards: usize, drifted: bool) -> String {
    let mut html = String::from("<html><body><div class=\"s-main-slot\">");
    for i in 0..cards {
        if drifted {
            html.push_str(&format!(
                "<div class=\"s-result-item\"><h2>Phone {i}</h2>\
                 <a class=\"a-link-normal\" href=\"/Phone-{i}/dp/B{i:09}\">view</a>\
                 <span class=\"a-offscreen\">₹{},{:03}.00</span></div>",
                10 + i % 40,
                i % 1000
            ));
        } else {
            html.push_str(&format!(
                "<div data-component-type=\"s-search-result\">\
                 <h2><a class=\"a-link-normal\" href=\"/Phone-{i}/dp/B{i:09}\"><span>Phone {i}</span></a></h2>\
                 <span class=\"a-price\"><span class=\"a-price-whole\">{},{:03}</span></span></div>",
                10 + i % 40,
                i % 1000
            ));
        }
    }
    html.push_str("</div></body></html>");
    html
}

fn reviews_html(units: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..units {
        html.push_str(&format!(
            "<div data-hook=\"review\"><a data-hook=\"review-title\">Review number {i} is great\n5.0 out of 5 stars</a></div>"
        ));
    }
    html.push_str("<ul><li class=\"a-last\"><a href=\"/product-reviews/B01/?pageNumber=2\">Next</a></li></ul>");
    html.push_str("</body></html>");
    html
}

fn bench_listing(c: &mut Criterion) {
    let parser = ListingParser::from_profile(&SiteProfile::amazon()).unwrap();
    let mut group = c.benchmark_group("listing_extraction");

    for (label, drifted) in [("primary", false), ("fallback", true)] {
        let document = Html::parse_document(&listing_html(60, drifted));
        group.bench_with_input(BenchmarkId::new(label, 60), &document, |b, doc| {
            b.iter(|| black_box(parser.extract(&document_root(doc), 20)));
        });
    }

    group.finish();
}

fn bench_reviews(c: &mut Criterion) {
    let parser = ReviewPageParser::from_profile(&SiteProfile::amazon(), 5).unwrap();
    let document = Html::parse_document(&reviews_html(10));

    c.bench_function("review_page_units", |b| {
        b.iter(|| {
            let root = document_root(&document);
            black_box((parser.extract_units(&root, 1), parser.next_page(&root)))
        });
    });
}

fn bench_price(c: &mut Criterion) {
    let format = PriceFormat::default();
    c.bench_function("normalize_price", |b| {
        b.iter(|| black_box(normalize_price(black_box("₹1,23,456.00 M.R.P: ₹1,49,999"), &format)));
    });
}

criterion_group!(benches, bench_listing, bench_reviews, bench_price);
criterion_main!(benches);
