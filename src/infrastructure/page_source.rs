//! Page source collaborator
//!
//! The core never talks to the network. A [`PageSource`] hands it raw HTML;
//! parsing happens synchronously on the caller's side so no parsed tree is
//! ever held across an await.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch_retry::{fetch_with_retry, FetchOutcome, RetryPolicy};
use super::pagination::PageCursor;
use super::parsing::{ContextualParser, NextPage, ParseContext, ReviewPage, ReviewPageParser};
use super::parsing_error::{ParsingError, ParsingResult};
use crate::domain::ReviewUnit;

/// Supplier of raw documents
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Raw HTML of `url`.
    ///
    /// Network or timeout problems are reported as
    /// [`ParsingError::TransientFetch`]; a page that cannot exist as
    /// [`ParsingError::PageNotFound`].
    async fn fetch(&self, url: &Url) -> ParsingResult<String>;
}

#[derive(Debug, Deserialize)]
struct FixtureManifest {
    /// URL → HTML file, relative to the manifest directory
    pages: HashMap<String, PathBuf>,
    /// URL → number of leading fetches that fail transiently
    #[serde(default)]
    transient_failures: HashMap<String, u32>,
}

/// Directory-backed page source driven by `manifest.json`
#[derive(Debug)]
pub struct FixturePageSource {
    root: PathBuf,
    pages: HashMap<String, PathBuf>,
    pending_failures: Mutex<HashMap<String, u32>>,
}

fn manifest_key(raw: &str) -> String {
    Url::parse(raw).map_or_else(|_| raw.to_string(), |url| url.to_string())
}

impl FixturePageSource {
    pub const MANIFEST: &'static str = "manifest.json";

    /// Open a fixture directory containing `manifest.json`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(Self::MANIFEST);
        let raw = fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("Failed to read fixture manifest {:?}", manifest_path))?;
        let manifest: FixtureManifest = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid fixture manifest {:?}", manifest_path))?;

        info!("📂 Loaded {} fixture pages from {:?}", manifest.pages.len(), root);

        Ok(Self {
            root,
            pages: manifest
                .pages
                .into_iter()
                .map(|(url, file)| (manifest_key(&url), file))
                .collect(),
            pending_failures: Mutex::new(
                manifest
                    .transient_failures
                    .into_iter()
                    .map(|(url, count)| (manifest_key(&url), count))
                    .collect(),
            ),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn take_failure(&self, key: &str) -> bool {
        let Ok(mut pending) = self.pending_failures.lock() else {
            return false;
        };
        match pending.get_mut(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl PageSource for FixturePageSource {
    async fn fetch(&self, url: &Url) -> ParsingResult<String> {
        let key = url.to_string();
        if self.take_failure(&key) {
            return Err(ParsingError::transient_fetch(&key, "simulated connection reset"));
        }

        let Some(file) = self.pages.get(&key) else {
            return Err(ParsingError::PageNotFound { url: key });
        };

        let path = self.root.join(file);
        debug!("Serving {} from {:?}", key, path);
        fs::read_to_string(&path)
            .await
            .map_err(|e| ParsingError::transient_fetch(&key, &e.to_string()))
    }
}

/// Cursor that follows "next page" links through a [`PageSource`]
pub struct LinkedReviewCursor<'a, S: ?Sized> {
    source: &'a S,
    parser: &'a ReviewPageParser,
    policy: &'a RetryPolicy,
    cancel: &'a CancellationToken,
    page_number: u32,
    units: Vec<ReviewUnit>,
    next: NextPage,
}

impl<'a, S> LinkedReviewCursor<'a, S>
where
    S: PageSource + ?Sized,
{
    /// Start on an already fetched first page.
    pub fn new(
        source: &'a S,
        parser: &'a ReviewPageParser,
        policy: &'a RetryPolicy,
        cancel: &'a CancellationToken,
        first_page: &str,
    ) -> Self {
        let mut cursor = Self {
            source,
            parser,
            policy,
            cancel,
            page_number: 1,
            units: Vec::new(),
            next: NextPage::Absent,
        };
        cursor.load(first_page);
        cursor
    }

    fn load(&mut self, html: &str) {
        let document = Html::parse_document(html);
        let ReviewPage { units, next } = self
            .parser
            .parse_with_context(&document, &ParseContext::new(self.page_number));
        self.units = units;
        self.next = next;
    }
}

#[async_trait]
impl<S> PageCursor for LinkedReviewCursor<'_, S>
where
    S: PageSource + ?Sized,
{
    fn page_number(&self) -> u32 {
        self.page_number
    }

    async fn extract_units(&mut self) -> Vec<ReviewUnit> {
        self.units.clone()
    }

    async fn advance(&mut self) -> ParsingResult<bool> {
        let Some(url) = self.next.url().cloned() else {
            debug!("No next page after page {} ({:?})", self.page_number, self.next);
            return Ok(false);
        };

        let source = self.source;
        let outcome = fetch_with_retry(
            |_| source.fetch(&url),
            |html: &String| !html.trim().is_empty(),
            self.policy,
            self.cancel,
        )
        .await;

        match outcome {
            FetchOutcome::Accepted { document, .. } => {
                self.page_number += 1;
                self.load(&document);
                Ok(true)
            }
            FetchOutcome::Exhausted { attempts } => Err(ParsingError::transient_fetch(
                url.as_str(),
                &format!("gave up after {} attempts", attempts.len()),
            )),
            FetchOutcome::Cancelled { .. } => Ok(false),
            FetchOutcome::Failed { error, .. } => {
                warn!("Review page {} unavailable: {}", url, error);
                Err(error)
            }
        }
    }
}
