pub mod agent;
pub mod fetcher;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

pub use agent::{remove_nodes, apply_stored, RemovalReport};
pub use fetcher::PageFetcher;

/// Ordered list of CSS selector paths. Insertion order is preserved but not
/// semantically meaningful; empty entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorList(Vec<String>);

impl SelectorList {
    pub fn new(selectors: Vec<String>) -> Self {
        SelectorList(selectors.into_iter().filter(|s| !s.is_empty()).collect())
    }

    /// Parse the popup input format: comma-separated selectors, whitespace
    /// trimmed, blank segments discarded.
    pub fn parse_input(input: &str) -> Self {
        let selectors = input
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        SelectorList(selectors)
    }

    /// Inverse of `parse_input`, used to populate the input field.
    pub fn join(&self) -> String {
        self.0.join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for SelectorList {
    fn from(selectors: Vec<String>) -> Self {
        SelectorList::new(selectors)
    }
}

impl<'a> IntoIterator for &'a SelectorList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A parsed page held for node removal and re-serialization.
pub struct PageDom {
    html: Html,
}

impl PageDom {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Detach every node matching `selector`, in document order. Returns the
    /// number of nodes removed; zero matches is a valid outcome.
    pub fn remove_matching(&mut self, selector: &Selector) -> usize {
        let ids: Vec<_> = self.html.select(selector).map(|el| el.id()).collect();
        let mut removed = 0;
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }

    /// Count nodes currently matching `selector` without removing them.
    pub fn count_matching(&self, selector: &Selector) -> usize {
        self.html.select(selector).count()
    }

    /// Serialized markup of the document root.
    pub fn to_markup(&self) -> String {
        self.html.root_element().html()
    }
}
