//! Contract between the daemon and the browser extension.
//! [native::NativeMessagingSource] is the production implementation, reading
//! the extension's messages from stdin.

pub mod domain;
pub mod native;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A tab transition reported by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TabEvent {
    /// A different tab gained focus.
    Activated { tab_id: i64, url: String },
    /// A tab navigated to a new url.
    UrlChanged { tab_id: i64, url: String },
}

/// Ordered stream of tab events. `None` means the extension closed the
/// stream and no more events will arrive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + 'static {
    async fn next_event(&mut self) -> Result<Option<TabEvent>>;
}

/// Remembers the tab the extension last reported as focused. Native messaging
/// has no request channel to ask the browser directly, and since events arrive
/// in order this cache is exactly as fresh as a real query would be. Used to
/// reopen a session after a flush.
#[derive(Debug, Default)]
pub struct CurrentTab {
    tab: Option<(i64, String)>,
}

impl CurrentTab {
    pub fn observe(&mut self, event: &TabEvent) {
        match event {
            TabEvent::Activated { tab_id, url } => self.tab = Some((*tab_id, url.clone())),
            TabEvent::UrlChanged { tab_id, url } => {
                if matches!(&self.tab, Some((current, _)) if current == tab_id) {
                    self.tab = Some((*tab_id, url.clone()));
                }
            }
        }
    }

    pub fn get(&self) -> Option<(i64, &str)> {
        self.tab.as_ref().map(|(tab_id, url)| (*tab_id, url.as_str()))
    }
}
