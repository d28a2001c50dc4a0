use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use url::Url;

use super::money::Money;

/// Price of a listing: either a well-formed amount or an explicit sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "amount", rename_all = "snake_case")]
pub enum Price {
    Available(Money),
    Unavailable,
}

impl Price {
    pub const fn money(&self) -> Option<&Money> {
        match self {
            Self::Available(money) => Some(money),
            Self::Unavailable => None,
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// One normalised listing entry produced by a single extraction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub price: Price,
    pub link: Url,
    /// Zero-based position of the candidate container in the listing
    #[serde(rename = "sourceRank")]
    pub source_rank: usize,
}

/// Cheapest record with an available price.
///
/// Unavailable prices never take part; ties keep the earliest rank. Records
/// whose currency differs from the first priced record are skipped, since
/// their amounts are not comparable.
pub fn lowest_priced(records: &[Record]) -> Option<&Record> {
    let mut best: Option<(&Record, &Money)> = None;

    for record in records {
        let Some(money) = record.price.money() else {
            continue;
        };
        best = match best {
            None => Some((record, money)),
            Some((current, current_money)) => match money.compare_amount(current_money) {
                Some(Ordering::Less) => Some((record, money)),
                _ => Some((current, current_money)),
            },
        };
    }

    best.map(|(record, _)| record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: usize, price: Option<&str>) -> Record {
        Record {
            title: format!("item {rank}"),
            price: price
                .and_then(|p| Money::from_decimal_str(p, "INR"))
                .map_or(Price::Unavailable, Price::Available),
            link: Url::parse(&format!("https://shop.example/p/{rank}")).unwrap(),
            source_rank: rank,
        }
    }

    #[test]
    fn lowest_price_skips_unavailable() {
        let records = vec![
            record(0, None),
            record(1, Some("499.00")),
            record(2, Some("450")),
            record(3, None),
        ];
        assert_eq!(lowest_priced(&records).map(|r| r.source_rank), Some(2));
    }

    #[test]
    fn lowest_price_tie_keeps_earliest_rank() {
        let records = vec![record(0, Some("450")), record(1, Some("450.00"))];
        assert_eq!(lowest_priced(&records).map(|r| r.source_rank), Some(0));
    }

    #[test]
    fn lowest_price_of_all_unavailable_is_none() {
        let records = vec![record(0, None), record(1, None)];
        assert!(lowest_priced(&records).is_none());
    }
}
