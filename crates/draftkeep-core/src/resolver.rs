//! Conversation identity from the navigation location

use draftkeep_host::ConversationId;
use regex::Regex;

use crate::config::DEFAULT_CONVERSATION_PATTERN;
use crate::error::{Error, Result};

/// Extracts a [`ConversationId`] from a URL by pattern match
#[derive(Debug, Clone)]
pub struct ConversationResolver {
    pattern: Regex,
}

impl ConversationResolver {
    /// Build a resolver; capture group 1 of `pattern` is the id.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        if pattern.captures_len() < 2 {
            return Err(Error::Config(format!(
                "pattern '{}' has no capture group",
                pattern.as_str()
            )));
        }
        Ok(Self { pattern })
    }

    /// The conversation the URL points at, if it is a conversation view
    pub fn resolve(&self, url: &str) -> Option<ConversationId> {
        self.pattern
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
            .map(ConversationId::new)
    }
}

impl Default for ConversationResolver {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_CONVERSATION_PATTERN).expect("default pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_hyphenated_id() {
        let resolver = ConversationResolver::default();
        assert_eq!(
            resolver.resolve("https://x.com/messages/111-222"),
            Some(ConversationId::from("111-222"))
        );
    }

    #[test]
    fn test_ignores_trailing_path_and_query() {
        let resolver = ConversationResolver::default();
        assert_eq!(
            resolver.resolve("https://x.com/messages/123/info?ref=1"),
            Some(ConversationId::from("123"))
        );
    }

    #[test]
    fn test_non_conversation_views() {
        let resolver = ConversationResolver::default();
        assert_eq!(resolver.resolve("https://x.com/home"), None);
        assert_eq!(resolver.resolve("https://x.com/messages"), None);
        assert_eq!(resolver.resolve("https://x.com/messages/compose"), None);
    }

    #[test]
    fn test_idempotent() {
        let resolver = ConversationResolver::default();
        let url = "https://x.com/messages/9-8";
        assert_eq!(resolver.resolve(url), resolver.resolve(url));
    }

    #[test]
    fn test_custom_pattern() {
        let resolver = ConversationResolver::new(r"/chat/([a-z]+)").unwrap();
        assert_eq!(
            resolver.resolve("https://example.com/chat/abc"),
            Some(ConversationId::from("abc"))
        );
    }

    #[test]
    fn test_pattern_without_group_rejected() {
        assert!(ConversationResolver::new("/messages/").is_err());
    }
}
