//! Persistence media the draft store can sit on

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use file::FileMedium;
pub use memory::MemoryMedium;

/// Asynchronous key-value storage.
///
/// Both operations may fail with [`crate::Error::ContextInvalidated`] when
/// the owning context goes away mid-call.
#[async_trait]
pub trait Medium: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write a value, replacing whatever was stored under the key
    async fn write(&self, key: &str, value: serde_json::Value) -> Result<()>;
}
