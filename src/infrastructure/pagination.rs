//! Pagination walker for multi-page review traversal
//!
//! The walker owns the loop and the stop rules; the [`PageCursor`] owns the
//! page handle. Every walk is bounded by `max_pages` and returns whatever it
//! has collected, including on cancellation.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::parsing_error::ParsingResult;
use crate::domain::ReviewUnit;

/// Stateful handle on the current page of a traversal
#[async_trait]
pub trait PageCursor: Send {
    /// 1-based number of the current page
    fn page_number(&self) -> u32;

    /// Review units on the current page
    async fn extract_units(&mut self) -> Vec<ReviewUnit>;

    /// Move to the next page. `Ok(false)` means no further page is reachable.
    async fn advance(&mut self) -> ParsingResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSettings {
    pub max_pages: NonZeroU32,
    /// Pause between pages
    pub settle_delay: Duration,
}

impl WalkSettings {
    pub const fn new(max_pages: NonZeroU32, settle_delay: Duration) -> Self {
        Self {
            max_pages,
            settle_delay,
        }
    }
}

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The current page yielded no units
    EmptyPage,
    /// No next page, or navigation failed
    NoNextPage,
    PageLimit,
    Cancelled,
}

/// Units collected across pages, deduplicated by normalized text.
#[derive(Debug, Default)]
pub struct ReviewAccumulator {
    seen: HashSet<String>,
    units: Vec<ReviewUnit>,
}

impl ReviewAccumulator {
    /// Append `unit` unless its text was already collected.
    pub fn push(&mut self, unit: ReviewUnit) -> bool {
        if self.seen.insert(unit.dedup_key()) {
            self.units.push(unit);
            true
        } else {
            false
        }
    }

    /// Returns how many units were new.
    pub fn extend(&mut self, units: impl IntoIterator<Item = ReviewUnit>) -> usize {
        let mut added = 0;
        for unit in units {
            if self.push(unit) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_units(self) -> Vec<ReviewUnit> {
        self.units
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkOutcome {
    /// Unique units in first-seen order
    pub units: Vec<ReviewUnit>,
    pub pages_walked: u32,
    pub stop_reason: StopReason,
}

/// Walk pages until a terminal condition holds.
///
/// Per page: extract, stop on an empty page, advance (a failed advance counts
/// as no next page), stop at the page limit, then settle before the next page.
pub async fn walk<C>(
    cursor: &mut C,
    settings: &WalkSettings,
    cancel: &CancellationToken,
) -> WalkOutcome
where
    C: PageCursor + ?Sized,
{
    let mut accumulator = ReviewAccumulator::default();
    let mut pages_walked = 0u32;

    let stop_reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        let page_number = cursor.page_number();
        let page_units = cursor.extract_units().await;
        pages_walked += 1;

        if page_units.is_empty() {
            info!("Page {} has no review units, stopping", page_number);
            break StopReason::EmptyPage;
        }

        let found = page_units.len();
        let added = accumulator.extend(page_units);
        info!(
            "📄 Page {}: {} units, {} new ({} total)",
            page_number,
            found,
            added,
            accumulator.len()
        );

        let has_next = tokio::select! {
            biased;
            () = cancel.cancelled() => break StopReason::Cancelled,
            advanced = cursor.advance() => match advanced {
                Ok(has_next) => has_next,
                Err(e) => {
                    warn!("Navigation after page {} failed, treating as last page: {}", page_number, e);
                    false
                }
            },
        };

        if !has_next {
            break StopReason::NoNextPage;
        }

        if pages_walked >= settings.max_pages.get() {
            break StopReason::PageLimit;
        }

        if !settings.settle_delay.is_zero() {
            debug!("Settling for {:?} before page {}", settings.settle_delay, page_number + 1);
            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                () = tokio::time::sleep(settings.settle_delay) => {}
            }
        }
    };

    info!(
        "Review walk finished after {} pages: {:?}, {} unique units",
        pages_walked,
        stop_reason,
        accumulator.len()
    );

    WalkOutcome {
        units: accumulator.into_units(),
        pages_walked,
        stop_reason,
    }
}
