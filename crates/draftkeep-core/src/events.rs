//! Controller event types

use draftkeep_host::ConversationId;
use serde::{Deserialize, Serialize};

/// Events emitted while the controller runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    /// The active conversation changed (`None` when leaving conversations)
    ConversationChanged { conversation: Option<ConversationId> },

    /// Listeners are live on a composer
    SurfaceBound { conversation: ConversationId },

    /// The bound composer left the document; searching again
    SurfaceLost { conversation: ConversationId },

    /// A stored draft was injected into an empty composer
    Prefilled { conversation: ConversationId },

    /// A debounced save is being written
    Saving { conversation: ConversationId },

    /// The draft was written
    Saved {
        conversation: ConversationId,
        saved_at: i64,
    },

    /// Stored content already matched; nothing written
    SaveSkipped { conversation: ConversationId },

    /// The write failed
    SaveFailed {
        conversation: ConversationId,
        message: String,
    },

    /// The draft was removed after a send was confirmed
    DraftDeleted { conversation: ConversationId },

    /// The composer still had text when the send check ran; draft kept
    SendUnconfirmed { conversation: ConversationId },
}

impl DraftEvent {
    /// The conversation the event concerns, if any
    pub fn conversation(&self) -> Option<&ConversationId> {
        match self {
            DraftEvent::ConversationChanged { conversation } => conversation.as_ref(),
            DraftEvent::SurfaceBound { conversation }
            | DraftEvent::SurfaceLost { conversation }
            | DraftEvent::Prefilled { conversation }
            | DraftEvent::Saving { conversation }
            | DraftEvent::Saved { conversation, .. }
            | DraftEvent::SaveSkipped { conversation }
            | DraftEvent::SaveFailed { conversation, .. }
            | DraftEvent::DraftDeleted { conversation }
            | DraftEvent::SendUnconfirmed { conversation } => Some(conversation),
        }
    }

    /// Transient status to show next to the composer, if this event has one
    pub fn status(&self) -> Option<SaveStatus> {
        match self {
            DraftEvent::Saving { .. } => Some(SaveStatus::Saving),
            DraftEvent::Saved { .. } | DraftEvent::SaveSkipped { .. } => Some(SaveStatus::Saved),
            DraftEvent::SaveFailed { message, .. } => Some(SaveStatus::Failed(message.clone())),
            _ => None,
        }
    }
}

/// Short-lived save indicator for the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saving,
    Saved,
    Failed(String),
}

impl SaveStatus {
    pub fn label(&self) -> String {
        match self {
            SaveStatus::Saving => "Saving…".to_string(),
            SaveStatus::Saved => "Saved".to_string(),
            SaveStatus::Failed(message) => format!("Draft not saved: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let id = ConversationId::from("1-2");
        assert_eq!(
            DraftEvent::Saving { conversation: id.clone() }.status(),
            Some(SaveStatus::Saving)
        );
        assert_eq!(
            DraftEvent::SaveSkipped { conversation: id.clone() }.status(),
            Some(SaveStatus::Saved)
        );
        assert_eq!(DraftEvent::Prefilled { conversation: id }.status(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SaveStatus::Saving.label(), "Saving…");
        assert_eq!(SaveStatus::Saved.label(), "Saved");
        assert_eq!(
            SaveStatus::Failed("quota".into()).label(),
            "Draft not saved: quota"
        );
    }

    #[test]
    fn test_serialized_tag() {
        let event = DraftEvent::Saved {
            conversation: "1-2".into(),
            saved_at: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "saved");
        assert_eq!(json["conversation"], "1-2");
    }
}
