use scraper::Selector;
use tracing::{debug, warn};

use crate::error::Result;
use crate::origin::Origin;
use crate::page::{PageDom, SelectorList};
use crate::storage::SelectorStore;

/// Outcome of one removal pass over a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Nodes detached from the document.
    pub nodes_removed: usize,
    /// Selectors applied, whether or not they matched anything.
    pub selectors_applied: usize,
    /// Selectors skipped because they failed to parse.
    pub selectors_skipped: Vec<String>,
}

/// Direct-mode removal: apply an explicit selector list to a page.
///
/// Selectors are processed in list order; each one removes every matching
/// node in document order. A selector that fails to parse is logged and
/// skipped without affecting the rest of the list.
pub fn remove_nodes(dom: &mut PageDom, list: &SelectorList) -> RemovalReport {
    let mut report = RemovalReport::default();

    for path in list.iter() {
        match Selector::parse(path) {
            Ok(selector) => {
                let removed = dom.remove_matching(&selector);
                debug!("Removed {} node(s) at path \"{}\"", removed, path);
                report.nodes_removed += removed;
                report.selectors_applied += 1;
            }
            Err(e) => {
                warn!("Skipping unparseable selector \"{}\": {:?}", path, e);
                report.selectors_skipped.push(path.to_string());
            }
        }
    }

    report
}

/// Autonomous-mode removal: look up the stored selector list for the page's
/// own origin and apply it, as on a fresh navigation. Returns the resulting
/// markup alongside the report; a page with no stored selectors passes
/// through unchanged.
pub async fn apply_stored(
    store: &dyn SelectorStore,
    origin: &Origin,
    markup: &str,
) -> Result<(String, RemovalReport)> {
    let list = store.load(origin).await?;
    debug!("Nodes from storage of {}: {:?}", origin, list.as_slice());

    if list.is_empty() {
        return Ok((markup.to_string(), RemovalReport::default()));
    }

    let mut dom = PageDom::parse(markup);
    let report = remove_nodes(&mut dom, &list);
    Ok((dom.to_markup(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryKvStore, SelectorRepository};
    use std::sync::Arc;

    const PAGE: &str = concat!(
        "<html><body>",
        "<p class=\"promo\">one</p>",
        "<div id=\"banner\">two</div>",
        "<p class=\"promo\">three</p>",
        "<p class=\"promo\">four</p>",
        "<article>content</article>",
        "</body></html>",
    );

    #[test]
    fn test_remove_nodes_applies_each_selector() {
        let mut dom = PageDom::parse(PAGE);
        let list = SelectorList::parse_input("p.promo, #banner");

        let report = remove_nodes(&mut dom, &list);

        assert_eq!(report.nodes_removed, 4);
        assert_eq!(report.selectors_applied, 2);
        assert!(report.selectors_skipped.is_empty());

        let markup = dom.to_markup();
        assert!(markup.contains("content"));
        assert!(!markup.contains("promo"));
        assert!(!markup.contains("banner"));
    }

    #[test]
    fn test_invalid_selector_is_isolated() {
        let mut dom = PageDom::parse(PAGE);
        // The unparseable entry sits in the middle so isolation, not luck,
        // keeps the rest of the list running.
        let list = SelectorList::new(vec![
            "#banner".to_string(),
            ":::not-a-selector".to_string(),
            "p.promo".to_string(),
        ]);

        let report = remove_nodes(&mut dom, &list);

        assert_eq!(report.nodes_removed, 4);
        assert_eq!(report.selectors_applied, 2);
        assert_eq!(report.selectors_skipped, vec![":::not-a-selector".to_string()]);
    }

    #[test]
    fn test_only_invalid_selector_removes_nothing() {
        let mut dom = PageDom::parse(PAGE);
        let list = SelectorList::new(vec![":::bad".to_string()]);

        let report = remove_nodes(&mut dom, &list);

        assert_eq!(report.nodes_removed, 0);
        assert_eq!(report.selectors_applied, 0);
        assert!(dom.to_markup().contains("promo"));
    }

    #[tokio::test]
    async fn test_apply_stored_removes_saved_paths() {
        let store = SelectorRepository::new(Arc::new(MemoryKvStore::new()));
        let origin = Origin::from_url("https://example.com");

        store
            .save(&origin, &SelectorList::parse_input("p.promo"))
            .await
            .unwrap();

        let (markup, report) = apply_stored(&store, &origin, PAGE).await.unwrap();

        assert_eq!(report.nodes_removed, 3);
        assert!(!markup.contains("promo"));
        assert!(markup.contains("banner"));
    }

    #[tokio::test]
    async fn test_apply_stored_without_record_is_identity() {
        let store = SelectorRepository::new(Arc::new(MemoryKvStore::new()));
        let origin = Origin::from_url("https://example.com");

        let (markup, report) = apply_stored(&store, &origin, PAGE).await.unwrap();

        assert_eq!(report, RemovalReport::default());
        assert_eq!(markup, PAGE);
    }
}
