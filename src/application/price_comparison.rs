//! Cross-site price comparison

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{lowest_priced, Money, Record};

/// Cheapest priced record of one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteLowest {
    pub site: String,
    pub record: Record,
}

impl SiteLowest {
    fn money(&self) -> Option<&Money> {
        self.record.price.money()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceComparison {
    /// Per-site lowest prices in input order
    pub lowest: Vec<SiteLowest>,
    pub cheaper_site: String,
    /// Difference between the cheapest site and the next cheapest one
    pub savings: Money,
}

impl PriceComparison {
    /// Compare the lowest prices of each site's listing.
    ///
    /// Sites without a priced record are left out, as are sites whose currency
    /// differs from the first priced site. Needs at least two comparable
    /// sites; ties go to the site listed first.
    pub fn from_listings<'a, I>(listings: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [Record])>,
    {
        let mut lowest: Vec<SiteLowest> = Vec::new();

        for (site, records) in listings {
            let Some(record) = lowest_priced(records) else {
                debug!("{} has no priced records to compare", site);
                continue;
            };
            let candidate = SiteLowest {
                site: site.to_string(),
                record: record.clone(),
            };
            let comparable = match (lowest.first().and_then(SiteLowest::money), candidate.money()) {
                (Some(first), Some(money)) => first.compare_amount(money).is_some(),
                _ => true,
            };
            if comparable {
                lowest.push(candidate);
            } else {
                debug!("{} priced in a different currency, skipped", site);
            }
        }

        if lowest.len() < 2 {
            return None;
        }

        let mut ranked: Vec<&SiteLowest> = lowest.iter().collect();
        // stable sort keeps input order on ties
        ranked.sort_by(|a, b| match (a.money(), b.money()) {
            (Some(x), Some(y)) => x.compare_amount(y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        });

        let cheapest = ranked[0];
        let runner_up = ranked[1];
        let savings = cheapest.money()?.abs_diff(runner_up.money()?)?;
        let cheaper_site = cheapest.site.clone();

        info!(
            "💡 Better price on {} (saves {} {})",
            cheaper_site,
            savings,
            savings.currency()
        );

        Some(Self {
            lowest,
            cheaper_site,
            savings,
        })
    }
}
