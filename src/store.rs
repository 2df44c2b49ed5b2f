//! Keyed in-memory store for saved mock feed buffers.
//!
//! An opaque blob store at the boundary of this tool: no expiry, no size
//! bound, no knowledge of what the bytes contain.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;

#[derive(Debug, Default)]
pub struct MockStore {
    inner: RwLock<HashMap<String, Bytes>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a buffer and returns the id it can be fetched under; a
    /// missing or empty id gets a generated one.
    pub fn put(&self, id: Option<&str>, bytes: Bytes) -> String {
        let id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_id(),
        };
        self.lock_write().insert(id.clone(), bytes);
        id
    }

    pub fn get(&self, id: &str) -> Option<Bytes> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Removes the buffer; returns whether the id existed.
    pub fn remove(&self, id: &str) -> bool {
        self.lock_write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Bytes>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Time-and-counter id, unique within a process.
fn generate_id() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:x}{n:04x}")
}
