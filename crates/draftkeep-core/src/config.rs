//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default wait after the last keystroke before a draft is written
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default wait after a send click before checking the composer emptied
pub const DEFAULT_SEND_CHECK_DELAY_MS: u64 = 500;

/// Default medium key holding the draft map
pub const DEFAULT_STORAGE_KEY: &str = "drafts";

/// Default path pattern; the first capture group is the conversation id
pub const DEFAULT_CONVERSATION_PATTERN: &str = r"/messages/([0-9-]+)";

/// Configuration for draftkeep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftkeepConfig {
    /// Debounce window for saves, in milliseconds (0 saves on the next turn)
    pub debounce_ms: u64,
    /// Delay between a send click and the emptiness check, in milliseconds
    pub send_check_delay_ms: u64,
    /// Medium key under which the draft map is stored
    pub storage_key: String,
    /// Regex applied to the URL; capture group 1 is the conversation id
    pub conversation_pattern: String,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Structural queries for page elements
    pub selectors: SelectorConfig,
}

/// Ordered selector lists, most specific first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub composer: Vec<String>,
    pub send_trigger: Vec<String>,
    pub peer_label: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            composer: vec![
                "div[role='textbox'][data-testid='dmComposerTextInput']".to_string(),
                "div[contenteditable='true']".to_string(),
                "div[role='textbox']".to_string(),
            ],
            send_trigger: vec![
                "button[data-testid='dmComposerSendButton']".to_string(),
                "div[data-testid='dmComposerSendButton']".to_string(),
            ],
            peer_label: vec!["main div[role='heading']".to_string()],
        }
    }
}

impl Default for DraftkeepConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            send_check_delay_ms: DEFAULT_SEND_CHECK_DELAY_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            conversation_pattern: DEFAULT_CONVERSATION_PATTERN.to_string(),
            log_filter: None,
            selectors: SelectorConfig::default(),
        }
    }
}

impl DraftkeepConfig {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("draftkeep")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DRAFTKEEP_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load and validate config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        Self::default().save_to(&path)?;
        Ok(path)
    }

    /// Reject configs the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        let pattern = regex::Regex::new(&self.conversation_pattern)?;
        if pattern.captures_len() < 2 {
            return Err(Error::Config(
                "conversation_pattern needs a capture group for the id".to_string(),
            ));
        }
        if self.selectors.composer.is_empty() {
            return Err(Error::Config("selectors.composer is empty".to_string()));
        }
        if self.storage_key.is_empty() {
            return Err(Error::Config("storage_key is empty".to_string()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn send_check_delay(&self) -> Duration {
        Duration::from_millis(self.send_check_delay_ms)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# draftkeep configuration file
# Place at ~/.config/draftkeep/config.toml or point DRAFTKEEP_CONFIG_PATH at it

# Wait this long after the last keystroke before saving (0 = next turn)
debounce_ms = 500

# After a send click, wait this long before checking the composer emptied
send_check_delay_ms = 500

# Storage key holding all drafts
storage_key = "drafts"

# URL pattern; capture group 1 is the conversation id
conversation_pattern = "/messages/([0-9-]+)"

# Tracing filter when RUST_LOG is unset
# log_filter = "draftkeep=debug"

# Page lookups, tried in order. Specific selectors first, generic last.
[selectors]
composer = [
    "div[role='textbox'][data-testid='dmComposerTextInput']",
    "div[contenteditable='true']",
    "div[role='textbox']",
]
send_trigger = ["button[data-testid='dmComposerSendButton']"]
peer_label = ["main div[role='heading']"]
"#
}
