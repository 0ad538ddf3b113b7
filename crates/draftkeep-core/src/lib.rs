//! draftkeep-core: draft lifecycle controller
//!
//! Watches a host document for conversation changes, debounces edits on the
//! composition surface into the draft store, restores drafts when a
//! conversation is reopened and retires them after a send.

pub mod binder;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod handle;
pub mod resolver;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod watcher;

pub use binder::{BoundSurface, LocatedSurface, SelectorChain, SurfaceBinder};
pub use catalog::{DraftCatalog, DraftSummary, OpenTarget};
pub use config::{DraftkeepConfig, SelectorConfig};
pub use controller::DraftController;
pub use error::{Error, Result};
pub use events::{DraftEvent, SaveStatus};
pub use handle::ControllerHandle;
pub use resolver::ConversationResolver;
pub use session::Phase;
pub use store::{DraftStore, PutOutcome};
pub use watcher::{NavigationWatcher, WatchSignal};
