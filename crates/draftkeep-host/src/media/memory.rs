//! In-process medium

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use super::Medium;
use crate::error::{Error, Result};

/// Key-value medium held in memory.
///
/// Cloning shares the underlying storage, so a controller and a catalog
/// can both hold one.
#[derive(Clone, Default)]
pub struct MemoryMedium {
    values: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    invalidated: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the owning context being torn down; every later call fails.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    /// Undo [`MemoryMedium::invalidate`]
    pub fn revalidate(&self) {
        self.invalidated.store(false, Ordering::Release);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    /// Current value under a key, bypassing invalidation
    pub fn snapshot(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().get(key).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.invalidated.load(Ordering::Acquire) {
            return Err(Error::ContextInvalidated);
        }
        Ok(())
    }
}

#[async_trait]
impl Medium for MemoryMedium {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.check()?;
        Ok(self.values.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.check()?;
        self.values.lock().insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
