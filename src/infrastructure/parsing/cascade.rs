//! Selector cascade: ordered fallback strategies for one semantic field
//!
//! Markup drifts between requests, so every field is described by several
//! strategies in priority order. The resolver stops at the first strategy that
//! yields a non-empty trimmed value and never combines partial results.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{ParsingError, ParsingResult};
use crate::infrastructure::dom::DomNode;

/// Declarative form of a strategy, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    /// Text of the first descendant matching `selector`
    Text { selector: String },
    /// Attribute of the first descendant matching `selector`
    Attribute { selector: String, attr: String },
    /// Own text of the first descendant matching `selector` that contains
    /// `needle`; text of nested elements is not considered
    TextContains { selector: String, needle: String },
    /// Attribute read from the node itself
    OwnAttribute { attr: String },
}

impl StrategySpec {
    pub fn text(selector: &str) -> Self {
        Self::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attribute(selector: &str, attr: &str) -> Self {
        Self::Attribute {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    pub fn text_contains(selector: &str, needle: &str) -> Self {
        Self::TextContains {
            selector: selector.to_string(),
            needle: needle.to_string(),
        }
    }

    /// Stable human readable label used in logs
    pub fn label(&self) -> String {
        match self {
            Self::Text { selector } => format!("text({selector})"),
            Self::Attribute { selector, attr } => format!("attr({selector} @{attr})"),
            Self::TextContains { selector, needle } => {
                format!("contains({selector} ~ {needle:?})")
            }
            Self::OwnAttribute { attr } => format!("own_attr(@{attr})"),
        }
    }
}

/// A rule that may pull a value out of a node.
///
/// [`Strategy`] is the configured implementation; callers can supply their own.
pub trait ExtractionStrategy<N: DomNode> {
    fn name(&self) -> &str;

    fn apply(&self, node: &N) -> Option<String>;
}

#[derive(Debug, Clone)]
enum Rule {
    Text { selector: Selector },
    Attribute { selector: Selector, attr: String },
    TextContains { selector: Selector, needle: String },
    OwnAttribute { attr: String },
}

/// Compiled, immutable strategy
#[derive(Debug, Clone)]
pub struct Strategy {
    name: String,
    rule: Rule,
}

fn parse_selector(css: &str) -> ParsingResult<Selector> {
    Selector::parse(css).map_err(|e| ParsingError::invalid_selector(css, &e.to_string()))
}

impl Strategy {
    pub fn compile(spec: &StrategySpec) -> ParsingResult<Self> {
        let rule = match spec {
            StrategySpec::Text { selector } => Rule::Text {
                selector: parse_selector(selector)?,
            },
            StrategySpec::Attribute { selector, attr } => Rule::Attribute {
                selector: parse_selector(selector)?,
                attr: attr.clone(),
            },
            StrategySpec::TextContains { selector, needle } => Rule::TextContains {
                selector: parse_selector(selector)?,
                needle: needle.clone(),
            },
            StrategySpec::OwnAttribute { attr } => Rule::OwnAttribute { attr: attr.clone() },
        };

        Ok(Self {
            name: spec.label(),
            rule,
        })
    }

    /// Compile a cascade, keeping declaration order.
    ///
    /// Specs that fail to compile are skipped with a warning; the cascade is
    /// only rejected when nothing usable remains.
    pub fn compile_all(field: &str, specs: &[StrategySpec]) -> ParsingResult<Vec<Self>> {
        let mut strategies = Vec::with_capacity(specs.len());
        let mut errors = Vec::new();

        for spec in specs {
            match Self::compile(spec) {
                Ok(strategy) => strategies.push(strategy),
                Err(e) => {
                    warn!("Failed to compile {} strategy '{}': {}", field, spec.label(), e);
                    errors.push(e.to_string());
                }
            }
        }

        if strategies.is_empty() {
            return Err(ParsingError::NoStrategies {
                field: field.to_string(),
                errors,
            });
        }

        Ok(strategies)
    }
}

impl<N: DomNode> ExtractionStrategy<N> for Strategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, node: &N) -> Option<String> {
        match &self.rule {
            Rule::Text { selector } => node.select_first(selector).map(|n| n.text_content()),
            Rule::Attribute { selector, attr } => node
                .select_all(selector)
                .into_iter()
                .find_map(|n| n.attr_value(attr)),
            Rule::TextContains { selector, needle } => node
                .select_all(selector)
                .into_iter()
                .map(|n| n.own_text())
                .find(|text| text.contains(needle.as_str())),
            Rule::OwnAttribute { attr } => node.attr_value(attr),
        }
    }
}

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Found { value: String, strategy: String },
    NotFound,
}

impl FieldValue {
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound => None,
        }
    }

    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Try `strategies` in declaration order and return the first non-empty value.
pub fn resolve<N, S>(node: &N, strategies: &[S]) -> FieldValue
where
    N: DomNode,
    S: ExtractionStrategy<N>,
{
    for strategy in strategies {
        let value = strategy
            .apply(node)
            .map(|raw| raw.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(value) = value {
            trace!("Strategy {} matched", strategy.name());
            return FieldValue::Found {
                value,
                strategy: strategy.name().to_string(),
            };
        }
    }
    FieldValue::NotFound
}

/// Declarative form of a locator: a CSS selector, optionally climbing from
/// each match to an ancestor (`{ selector = "a[href*='/p/']", climb = 2 }`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocatorSpec {
    Css(String),
    Ancestor { selector: String, climb: usize },
}

impl LocatorSpec {
    pub fn ancestor(selector: &str, climb: usize) -> Self {
        Self::Ancestor {
            selector: selector.to_string(),
            climb,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Css(css) => css.clone(),
            Self::Ancestor { selector, climb } => format!("{selector} ^{climb}"),
        }
    }
}

impl From<&str> for LocatorSpec {
    fn from(css: &str) -> Self {
        Self::Css(css.to_string())
    }
}

/// Named rule that locates a set of nodes (cards, review blocks, pager links)
#[derive(Debug, Clone)]
pub struct Locator {
    name: String,
    selector: Selector,
    climb: usize,
}

impl Locator {
    pub fn compile(spec: &LocatorSpec) -> ParsingResult<Self> {
        let (css, climb) = match spec {
            LocatorSpec::Css(css) => (css, 0),
            LocatorSpec::Ancestor { selector, climb } => (selector, *climb),
        };
        Ok(Self {
            name: spec.label(),
            selector: parse_selector(css)?,
            climb,
        })
    }

    /// Same tolerance policy as [`Strategy::compile_all`].
    pub fn compile_all(field: &str, specs: &[LocatorSpec]) -> ParsingResult<Vec<Self>> {
        let mut locators = Vec::with_capacity(specs.len());
        let mut errors = Vec::new();

        for spec in specs {
            match Self::compile(spec) {
                Ok(locator) => locators.push(locator),
                Err(e) => {
                    warn!("Failed to compile {} selector '{}': {}", field, spec.label(), e);
                    errors.push(e.to_string());
                }
            }
        }

        if locators.is_empty() {
            return Err(ParsingError::NoStrategies {
                field: field.to_string(),
                errors,
            });
        }

        Ok(locators)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matches in document order. With a climb, each match is replaced by its
    /// ancestor that many levels up; matches sharing an ancestor yield it once.
    pub fn locate<N: DomNode>(&self, node: &N) -> Vec<N> {
        let matches = node.select_all(&self.selector);
        if self.climb == 0 {
            return matches;
        }

        let mut ancestors: Vec<N> = Vec::new();
        for found in matches {
            let ancestor = (0..self.climb).try_fold(found, |current, _| current.parent_element());
            if let Some(ancestor) = ancestor {
                if !ancestors.contains(&ancestor) {
                    ancestors.push(ancestor);
                }
            }
        }
        ancestors
    }
}

/// Nodes found by the first locator that produced at least one match
#[derive(Debug, Clone)]
pub struct Located<N> {
    pub strategy: Option<String>,
    pub nodes: Vec<N>,
    pub tried: Vec<String>,
}

impl<N> Located<N> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Container-level cascade: stop at the first locator yielding ≥1 node.
pub fn locate_first<N: DomNode>(node: &N, locators: &[Locator]) -> Located<N> {
    let mut tried = Vec::new();

    for locator in locators {
        tried.push(locator.name().to_string());
        let nodes = locator.locate(node);
        if !nodes.is_empty() {
            debug!("Found {} nodes using selector {}", nodes.len(), locator.name());
            return Located {
                strategy: Some(locator.name().to_string()),
                nodes,
                tried,
            };
        }
    }

    Located {
        strategy: None,
        nodes: Vec::new(),
        tried,
    }
}
