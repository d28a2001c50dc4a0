//! Minimal node capability interface over parsed documents
//!
//! Parsing components only need to walk children and parents, read attributes
//! and text, and test a CSS selector against a node. Any tree backend that can
//! do that can drive the cascade resolver and the extractors.

use scraper::{ElementRef, Html, Selector};

pub trait DomNode: Clone + PartialEq {
    /// Direct element children in document order
    fn child_elements(&self) -> Vec<Self>;

    fn parent_element(&self) -> Option<Self>;

    fn attr_value(&self, name: &str) -> Option<String>;

    /// Concatenated descendant text, untrimmed
    fn text_content(&self) -> String;

    /// Text of the node's own text children, ignoring nested elements
    fn own_text(&self) -> String;

    fn matches(&self, selector: &Selector) -> bool;

    /// All element descendants in pre-order, excluding `self`.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.child_elements().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.child_elements().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendants matching `selector`, in document order.
    fn select_all(&self, selector: &Selector) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|node| node.matches(selector))
            .collect()
    }

    fn select_first(&self, selector: &Selector) -> Option<Self> {
        self.select_all(selector).into_iter().next()
    }
}

impl DomNode for ElementRef<'_> {
    fn child_elements(&self) -> Vec<Self> {
        std::ops::Deref::deref(self)
            .children()
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn parent_element(&self) -> Option<Self> {
        std::ops::Deref::deref(self).parent().and_then(ElementRef::wrap)
    }

    fn attr_value(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(ToString::to_string)
    }

    fn text_content(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn own_text(&self) -> String {
        std::ops::Deref::deref(self)
            .children()
            .filter_map(|child| child.value().as_text().map(|text| &**text))
            .collect()
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(self)
    }

    // scraper's own matcher is faster than the generic walk; the scope node
    // itself is skipped so both paths agree.
    fn select_all(&self, selector: &Selector) -> Vec<Self> {
        let scope = self.id();
        ElementRef::select(self, selector)
            .filter(|node| node.id() != scope)
            .collect()
    }
}

/// Root element of a parsed document, the entry node for extraction passes.
pub fn document_root(document: &Html) -> ElementRef<'_> {
    document.root_element()
}
