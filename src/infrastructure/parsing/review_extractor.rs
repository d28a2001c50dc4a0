//! Review page parsing: review units and the "next page" control

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::cascade::{locate_first, Locator};
use super::config::SiteProfile;
use super::record_extractor::resolve_link;
use super::ParsingResult;
use crate::domain::ReviewUnit;
use crate::infrastructure::dom::DomNode;

/// State of the pager on a review page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "url", rename_all = "snake_case")]
pub enum NextPage {
    Link(Url),
    Disabled,
    Absent,
}

impl NextPage {
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Link(url) => Some(url),
            Self::Disabled | Self::Absent => None,
        }
    }
}

/// Everything pulled from one review page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPage {
    pub units: Vec<ReviewUnit>,
    pub next: NextPage,
}

#[derive(Debug, Clone)]
pub struct ReviewPageParser {
    unit_locators: Vec<Locator>,
    next_locators: Vec<Locator>,
    base_url: Url,
    min_chars: usize,
}

impl ReviewPageParser {
    pub fn from_profile(profile: &SiteProfile, min_chars: usize) -> ParsingResult<Self> {
        Ok(Self {
            unit_locators: Locator::compile_all("review unit", &profile.reviews.units)?,
            next_locators: Locator::compile_all("next page", &profile.reviews.next_page)?,
            base_url: profile.base()?,
            min_chars,
        })
    }

    /// Review units on this page in document order.
    ///
    /// Each node contributes its first non-blank line, kept only when longer
    /// than `min_chars` characters. Repeats within the page are collapsed.
    pub fn extract_units<N: DomNode>(&self, page: &N, page_number: u32) -> Vec<ReviewUnit> {
        let located = locate_first(page, &self.unit_locators);
        let mut seen = HashSet::new();

        let units: Vec<ReviewUnit> = located
            .nodes
            .iter()
            .filter_map(|node| {
                let text = node.text_content();
                let first_line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
                (first_line.chars().count() > self.min_chars)
                    .then(|| ReviewUnit::new(first_line, page_number))
            })
            .filter(|unit| seen.insert(unit.dedup_key()))
            .collect();

        info!(
            "Extracted {} review units from page {} (selector: {:?})",
            units.len(),
            page_number,
            located.strategy
        );
        units
    }

    /// Locate the next-page control.
    ///
    /// The first locator with a match decides; a control whose class list has
    /// `a-disabled` or that carries `aria-disabled="true"` means no next page.
    pub fn next_page<N: DomNode>(&self, page: &N) -> NextPage {
        let located = locate_first(page, &self.next_locators);
        let Some(control) = located.nodes.first() else {
            return NextPage::Absent;
        };

        if is_disabled(control) {
            debug!("Next page control is disabled");
            return NextPage::Disabled;
        }

        match control.attr_value("href").map(|href| resolve_link(href.trim(), &self.base_url)) {
            Some(Ok(url)) => NextPage::Link(url),
            Some(Err(e)) => {
                debug!("Next page link unusable: {}", e);
                NextPage::Absent
            }
            None => NextPage::Absent,
        }
    }
}

fn is_disabled<N: DomNode>(control: &N) -> bool {
    let class_disabled = control
        .attr_value("class")
        .is_some_and(|class| class.split_whitespace().any(|c| c == "a-disabled"));
    let aria_disabled = control
        .attr_value("aria-disabled")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
    class_disabled || aria_disabled
}
