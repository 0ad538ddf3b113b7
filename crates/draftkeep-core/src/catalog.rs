//! Draft listing and management for a settings surface
//!
//! Rendering is the surface's business; this module only shapes what it
//! shows and funnels its mutations through the same [`DraftStore`].

use chrono::{Local, TimeZone};
use draftkeep_host::{ConversationId, DraftRecord, markup};

use crate::error::Result;
use crate::store::DraftStore;

/// Characters of plain text kept in a preview
pub const PREVIEW_CHARS: usize = 140;

/// URL fragment identifying a tab already showing messages
pub const MESSAGES_VIEW_MARKER: &str = "/messages/";

/// One draft as a list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSummary {
    pub id: ConversationId,
    pub peer_label: String,
    pub saved_at: i64,
    pub preview: String,
    pub source_url: String,
}

impl DraftSummary {
    fn from_record(id: ConversationId, record: DraftRecord) -> Self {
        let peer_label = if record.display_name.trim().is_empty() {
            id.to_string()
        } else {
            record.display_name
        };
        Self {
            peer_label,
            saved_at: record.saved_at,
            preview: markup::preview(&record.content, PREVIEW_CHARS),
            source_url: record.source_url,
            id,
        }
    }

    /// Format the saved_at timestamp for display
    pub fn saved_at_display(&self) -> String {
        Local
            .timestamp_millis_opt(self.saved_at)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Where to open a draft's conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    /// The current tab already shows messages; navigate it
    ReuseTab(String),
    /// Open a new tab
    NewTab(String),
}

/// Read and manage every stored draft
#[derive(Clone)]
pub struct DraftCatalog {
    store: DraftStore,
}

impl DraftCatalog {
    pub fn new(store: DraftStore) -> Self {
        Self { store }
    }

    /// All drafts, newest first
    pub async fn list(&self) -> Result<Vec<DraftSummary>> {
        let mut drafts: Vec<DraftSummary> = self
            .store
            .all()
            .await?
            .into_iter()
            .map(|(id, record)| DraftSummary::from_record(id, record))
            .collect();
        drafts.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.id.cmp(&b.id)));
        Ok(drafts)
    }

    /// How to open a draft given the tab the user is on.
    ///
    /// `None` when the draft no longer exists.
    pub async fn open_target(
        &self,
        id: &ConversationId,
        current_tab_url: Option<&str>,
    ) -> Result<Option<OpenTarget>> {
        let Some(record) = self.store.get(id).await? else {
            return Ok(None);
        };
        let on_messages = current_tab_url.is_some_and(|url| url.contains(MESSAGES_VIEW_MARKER));
        Ok(Some(if on_messages {
            OpenTarget::ReuseTab(record.source_url)
        } else {
            OpenTarget::NewTab(record.source_url)
        }))
    }

    /// Remove one draft. Returns whether it existed.
    pub async fn delete(&self, id: &ConversationId) -> Result<bool> {
        let removed = self.store.delete(id).await?;
        if removed {
            tracing::info!("Draft for {} deleted by user", id);
        }
        Ok(removed)
    }

    /// Remove every draft
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("All drafts cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftkeep_host::media::MemoryMedium;
    use std::sync::Arc;

    fn record(content: &str, saved_at: i64, name: &str) -> DraftRecord {
        DraftRecord {
            content: content.to_string(),
            saved_at,
            display_name: name.to_string(),
            source_url: "https://x.com/messages/1-2".to_string(),
        }
    }

    async fn catalog_with(entries: &[(&str, DraftRecord)]) -> DraftCatalog {
        let store = DraftStore::new(Arc::new(MemoryMedium::new()));
        for (id, r) in entries {
            store.put(&ConversationId::from(*id), r.clone()).await.unwrap();
        }
        DraftCatalog::new(store)
    }

    #[tokio::test]
    async fn test_list_newest_first_with_previews() {
        let catalog = catalog_with(&[
            ("1", record("<b>old</b>", 1_000, "Ada")),
            ("2", record("new &amp; shiny", 2_000, "")),
        ])
        .await;

        let list = catalog.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, ConversationId::from("2"));
        assert_eq!(list[0].preview, "new & shiny");
        assert_eq!(list[0].peer_label, "2");
        assert_eq!(list[1].preview, "old");
        assert_eq!(list[1].peer_label, "Ada");
    }

    #[tokio::test]
    async fn test_open_target_depends_on_current_tab() {
        let catalog = catalog_with(&[("1-2", record("x", 1, "Ada"))]).await;
        let id = ConversationId::from("1-2");

        assert_eq!(
            catalog
                .open_target(&id, Some("https://x.com/messages/9-9"))
                .await
                .unwrap(),
            Some(OpenTarget::ReuseTab("https://x.com/messages/1-2".into()))
        );
        assert_eq!(
            catalog.open_target(&id, Some("https://x.com/home")).await.unwrap(),
            Some(OpenTarget::NewTab("https://x.com/messages/1-2".into()))
        );
        assert_eq!(
            catalog
                .open_target(&id, Some("https://x.com/messages_settings"))
                .await
                .unwrap(),
            Some(OpenTarget::NewTab("https://x.com/messages/1-2".into()))
        );
        assert_eq!(
            catalog.open_target(&id, None).await.unwrap(),
            Some(OpenTarget::NewTab("https://x.com/messages/1-2".into()))
        );
        assert_eq!(catalog.open_target(&"0".into(), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let catalog = catalog_with(&[
            ("1", record("a", 1, "")),
            ("2", record("b", 2, "")),
        ])
        .await;

        assert!(catalog.delete(&"1".into()).await.unwrap());
        assert!(!catalog.delete(&"1".into()).await.unwrap());
        assert_eq!(catalog.list().await.unwrap().len(), 1);

        catalog.clear().await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_saved_at_display_format() {
        let summary = DraftSummary::from_record("1".into(), record("a", 0, "Ada"));
        let shown = summary.saved_at_display();
        assert_eq!(shown.len(), "1970-01-01 00:00".len());
        assert!(shown.starts_with("19"));
    }
}
