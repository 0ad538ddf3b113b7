//! Core types shared between the host and the draft controller

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a single message thread, taken from the navigation path.
///
/// Equality is exact-string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Persisted snapshot of an in-progress message for one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    /// Rich-text markup of the composition surface
    pub content: String,
    /// Last write time, epoch milliseconds
    pub saved_at: i64,
    /// Human-readable peer label, or the conversation id when unresolvable
    pub display_name: String,
    /// URL that reopens the conversation
    pub source_url: String,
}

impl DraftRecord {
    /// Create a record stamped with the current time
    pub fn new(
        content: impl Into<String>,
        display_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            saved_at: chrono::Utc::now().timestamp_millis(),
            display_name: display_name.into(),
            source_url: source_url.into(),
        }
    }
}

/// The whole persisted state: conversation id to draft
pub type DraftMap = BTreeMap<ConversationId, DraftRecord>;

/// Identity of an element within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Handle for a registered listener, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Element events the controller cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Content of an editable region changed
    Input,
    /// A clickable element was activated
    Click,
}

/// A batch of document changes delivered to mutation observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Elements attached by this change
    pub added: Vec<ElementId>,
    /// Elements detached by this change
    pub removed: Vec<ElementId>,
}

impl MutationRecord {
    /// A mutation with no element detail, e.g. a history-API navigation
    pub fn empty() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_camel_case_fields() {
        let record = DraftRecord {
            content: "<b>hi</b>".into(),
            saved_at: 42,
            display_name: "Ada".into(),
            source_url: "https://x.com/messages/1-2".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["savedAt"], 42);
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["sourceUrl"], "https://x.com/messages/1-2");
    }

    #[test]
    fn test_conversation_id_serializes_as_map_key() {
        let mut map = DraftMap::new();
        map.insert(
            ConversationId::from("111-222"),
            DraftRecord::new("A", "111-222", "u"),
        );
        let json = serde_json::to_value(&map).unwrap();
        assert!(json.get("111-222").is_some());
    }
}
