use serde::{Deserialize, Serialize};

/// A review text fragment and the page it was collected from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUnit {
    pub text: String,
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
}

impl ReviewUnit {
    pub fn new(text: impl Into<String>, page_number: u32) -> Self {
        Self {
            text: text.into(),
            page_number,
        }
    }

    /// Dedup key for this unit, see [`normalize_review_text`].
    pub fn dedup_key(&self) -> String {
        normalize_review_text(&self.text)
    }
}

/// Case-folded text with whitespace runs collapsed to a single space.
pub fn normalize_review_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_spacing() {
        let a = ReviewUnit::new("  Great   Phone ", 1);
        let b = ReviewUnit::new("great phone", 2);
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key(), "great phone");
    }
}
