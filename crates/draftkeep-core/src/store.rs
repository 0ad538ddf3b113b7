//! Draft persistence on top of a [`Medium`]
//!
//! The whole draft map lives under one medium key. Every operation is a
//! read-modify-write of that map; there is no locking against other
//! writers, so the last write wins.

use draftkeep_host::{ConversationId, DraftMap, DraftRecord, Medium};
use std::sync::Arc;

use crate::config::DEFAULT_STORAGE_KEY;
use crate::error::Result;

/// What a [`DraftStore::put`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The record was written
    Written,
    /// Stored content already matched; nothing was written
    Unchanged,
}

/// Conversation id to draft mapping
#[derive(Clone)]
pub struct DraftStore {
    medium: Arc<dyn Medium>,
    key: String,
}

impl DraftStore {
    pub fn new(medium: Arc<dyn Medium>) -> Self {
        Self::with_key(medium, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(medium: Arc<dyn Medium>, key: impl Into<String>) -> Self {
        Self {
            medium,
            key: key.into(),
        }
    }

    /// Every stored draft
    pub async fn all(&self) -> Result<DraftMap> {
        match self.medium.read(&self.key).await? {
            Some(serde_json::Value::Null) | None => Ok(DraftMap::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// The draft for a conversation; `None` when there is none
    pub async fn get(&self, id: &ConversationId) -> Result<Option<DraftRecord>> {
        Ok(self.all().await?.remove(id))
    }

    /// Upsert a draft, skipping the write when the content is unchanged
    pub async fn put(&self, id: &ConversationId, record: DraftRecord) -> Result<PutOutcome> {
        let mut drafts = self.all().await?;
        if drafts
            .get(id)
            .is_some_and(|existing| existing.content == record.content)
        {
            return Ok(PutOutcome::Unchanged);
        }
        drafts.insert(id.clone(), record);
        self.persist(&drafts).await?;
        Ok(PutOutcome::Written)
    }

    /// Remove a draft. Returns whether one existed.
    pub async fn delete(&self, id: &ConversationId) -> Result<bool> {
        let mut drafts = self.all().await?;
        if drafts.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&drafts).await?;
        Ok(true)
    }

    /// Drop every draft
    pub async fn clear(&self) -> Result<()> {
        self.persist(&DraftMap::new()).await
    }

    async fn persist(&self, drafts: &DraftMap) -> Result<()> {
        self.medium
            .write(&self.key, serde_json::to_value(drafts)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftkeep_host::media::MemoryMedium;

    fn store() -> (DraftStore, MemoryMedium) {
        let medium = MemoryMedium::new();
        (DraftStore::new(Arc::new(medium.clone())), medium)
    }

    fn record(content: &str) -> DraftRecord {
        DraftRecord::new(content, "peer", "https://x.com/messages/1-2")
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (store, _) = store();
        assert!(store.get(&"1-2".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (store, _) = store();
        let id = ConversationId::from("1-2");
        assert_eq!(store.put(&id, record("A")).await.unwrap(), PutOutcome::Written);
        assert_eq!(store.get(&id).await.unwrap().unwrap().content, "A");
    }

    #[tokio::test]
    async fn test_identical_content_is_not_rewritten() {
        let (store, medium) = store();
        let id = ConversationId::from("1-2");
        store.put(&id, record("A")).await.unwrap();
        let writes = medium.write_count();

        assert_eq!(store.put(&id, record("A")).await.unwrap(), PutOutcome::Unchanged);
        assert_eq!(medium.write_count(), writes);

        assert_eq!(store.put(&id, record("AB")).await.unwrap(), PutOutcome::Written);
        assert_eq!(medium.write_count(), writes + 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, medium) = store();
        let id = ConversationId::from("1-2");
        assert!(!store.delete(&id).await.unwrap());
        assert_eq!(medium.write_count(), 0);

        store.put(&id, record("A")).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_conversations_untouched() {
        let (store, _) = store();
        store.put(&"1".into(), record("one")).await.unwrap();
        store.put(&"2".into(), record("two")).await.unwrap();
        store.delete(&"1".into()).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&ConversationId::from("2")].content, "two");
    }

    #[tokio::test]
    async fn test_clear() {
        let (store, medium) = store();
        store.put(&"1".into(), record("one")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(medium.snapshot("drafts"), Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_invalidated_medium_surfaces_as_context_error() {
        let (store, medium) = store();
        medium.invalidate();
        let err = store.put(&"1".into(), record("A")).await.unwrap_err();
        assert!(err.is_context_invalidated());
    }

    #[tokio::test]
    async fn test_custom_key() {
        let medium = MemoryMedium::new();
        let store = DraftStore::with_key(Arc::new(medium.clone()), "dm_drafts");
        store.put(&"1".into(), record("A")).await.unwrap();
        assert!(medium.snapshot("dm_drafts").is_some());
        assert!(medium.snapshot("drafts").is_none());
    }
}
