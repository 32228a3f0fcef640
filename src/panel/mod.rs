use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::origin::Origin;
use crate::page::{remove_nodes, PageDom, RemovalReport, SelectorList};
use crate::storage::SelectorStore;

/// Source of the active tab's URL. Popup-style invocation assumes exactly
/// one active tab, so implementations yield a single URL.
#[async_trait]
pub trait TabQuery: Send + Sync {
    async fn active_tab_url(&self) -> Result<String>;
}

/// Applies a selector list to the live page. The list travels as an explicit
/// parameter; there is no ambient channel between panel and page.
#[async_trait]
pub trait Injector: Send + Sync {
    async fn inject(&self, list: &SelectorList) -> Result<RemovalReport>;
}

/// Tab query with a known URL, the CLI's stand-in for an active tab.
pub struct FixedTab {
    url: String,
}

impl FixedTab {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl TabQuery for FixedTab {
    async fn active_tab_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }
}

/// The live page a panel operates on. Holds the current markup; each
/// injection re-parses, removes, and re-serializes, so removals accumulate
/// across calls the way they would in a running page.
pub struct PageSession {
    markup: Mutex<String>,
}

impl PageSession {
    pub fn new(markup: String) -> Self {
        Self {
            markup: Mutex::new(markup),
        }
    }

    /// Current markup of the session's page.
    pub fn snapshot(&self) -> String {
        self.markup.lock().clone()
    }
}

#[async_trait]
impl Injector for PageSession {
    async fn inject(&self, list: &SelectorList) -> Result<RemovalReport> {
        let mut markup = self.markup.lock();
        let mut dom = PageDom::parse(&markup);
        let report = remove_nodes(&mut dom, list);
        if report.nodes_removed > 0 {
            *markup = dom.to_markup();
        }
        Ok(report)
    }
}

/// What the popup shows after an operation: the resolved origin, the input
/// field contents (`None` when storage was unavailable and the field must
/// not be overwritten), and the removal outcome on the live page.
#[derive(Debug)]
pub struct PanelView {
    pub origin: Origin,
    pub input: Option<String>,
    pub report: RemovalReport,
}

/// Popup-equivalent control flow over storage, tab query, and injection.
pub struct ControlPanel {
    tabs: Arc<dyn TabQuery>,
    injector: Arc<dyn Injector>,
    store: Arc<dyn SelectorStore>,
}

impl ControlPanel {
    pub fn new(
        tabs: Arc<dyn TabQuery>,
        injector: Arc<dyn Injector>,
        store: Arc<dyn SelectorStore>,
    ) -> Self {
        Self {
            tabs,
            injector,
            store,
        }
    }

    /// Resolve the active tab's origin without touching storage.
    pub async fn origin(&self) -> Result<Origin> {
        let url = self.tabs.active_tab_url().await?;
        Ok(Origin::from_url(&url))
    }

    /// Popup-open flow: load the origin's saved list, populate the input
    /// field, and inject the list so the open page reflects saved state.
    /// Injection strictly follows the completed load. If storage is
    /// unavailable the input field is left untouched rather than cleared.
    pub async fn initialize(&self) -> Result<PanelView> {
        let origin = self.origin().await?;

        let list = match self.store.load(&origin).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Storage unavailable for {}: {}", origin, e);
                return Ok(PanelView {
                    origin,
                    input: None,
                    report: RemovalReport::default(),
                });
            }
        };

        debug!("Nodes from storage for {}: {:?}", origin, list.as_slice());

        let report = if list.is_empty() {
            RemovalReport::default()
        } else {
            match self.injector.inject(&list).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("Injection failed for {}: {}", origin, e);
                    RemovalReport::default()
                }
            }
        };

        Ok(PanelView {
            origin,
            input: Some(list.join()),
            report,
        })
    }

    /// Form-submit flow: parse the input text into a selector list, then
    /// inject it and save it. The two effects are independent and issued
    /// jointly; neither waits on the other. Injection failure is logged
    /// only, save failure is returned.
    pub async fn submit(&self, origin: &Origin, input: &str) -> Result<(SelectorList, RemovalReport)> {
        let list = SelectorList::parse_input(input);

        let (inject_result, save_result) = tokio::join!(
            self.injector.inject(&list),
            self.store.save(origin, &list),
        );

        let report = match inject_result {
            Ok(report) => report,
            Err(e) => {
                warn!("Injection failed for {}: {}", origin, e);
                RemovalReport::default()
            }
        };

        save_result?;
        Ok((list, report))
    }

    /// Clear the origin's record. Completion means the input field may be
    /// reset to empty; nodes already removed from the live page stay
    /// removed.
    pub async fn clear(&self, origin: &Origin) -> Result<()> {
        self.store.clear(origin).await
    }
}
