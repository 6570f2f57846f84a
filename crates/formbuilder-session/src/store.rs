//! The session store collaborator.
//!
//! Render sessions are written once when a form is displayed and read back
//! when the form is submitted. Entries carry a timeout; an expired entry is
//! indistinguishable from one that was never written.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use formbuilder_core::FormResult;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::hex_encode;

/// A key/value session store with per-entry timeouts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads a live entry. Expired or missing entries yield `None`.
    async fn get(&self, key: &str) -> FormResult<Option<serde_json::Value>>;

    /// Writes an entry that expires `timeout_secs` seconds from now.
    async fn set(&self, key: &str, value: serde_json::Value, timeout_secs: u64) -> FormResult<()>;

    /// Removes an entry if present.
    async fn remove(&self, key: &str) -> FormResult<()>;

    /// Drops every expired entry.
    async fn clear_expired(&self) -> FormResult<()>;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    value: serde_json::Value,
    expire_date: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expire_date
    }
}

/// An in-memory session store.
///
/// Entries are lost when the process exits; suitable for tests and single
/// process deployments. Expired entries are swept on every write.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Moves an entry's expiry into the past, as if its timeout had elapsed.
    pub async fn expire_now(&self, key: &str) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.expire_date = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> FormResult<Option<serde_json::Value>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: serde_json::Value, timeout_secs: u64) -> FormResult<()> {
        let expire_date = i64::try_from(timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = SessionEntry { value, expire_date };
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired());
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> FormResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear_expired(&self) -> FormResult<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired());
        tracing::debug!(removed = before - entries.len(), "expired sessions cleared");
        Ok(())
    }
}

static NONCE: AtomicU64 = AtomicU64::new(0);

/// Generates a fresh, unguessable session identifier.
///
/// The identifier is the SHA-256 of 16 random bytes, a process-wide nonce
/// and the current timestamp, hex encoded (64 characters).
pub fn new_session_id() -> String {
    let mut random = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut random);
    let nonce = NONCE.fetch_add(1, Ordering::Relaxed);
    let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(random);
    hasher.update(nonce.to_le_bytes());
    hasher.update(now.to_le_bytes());
    hex_encode(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemorySessionStore::new();
        store
            .set("forms.a", serde_json::json!({"formType": "insertForm"}), 300)
            .await
            .unwrap();
        let value = store.get("forms.a").await.unwrap().unwrap();
        assert_eq!(value["formType"], "insertForm");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = InMemorySessionStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_timeout_is_expired() {
        let store = InMemorySessionStore::new();
        store.set("k", serde_json::json!(1), 0).await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_now_and_clear() {
        let store = InMemorySessionStore::new();
        store.set("k", serde_json::json!(1), 300).await.unwrap();
        store.set("j", serde_json::json!(2), 300).await.unwrap();
        store.expire_now("k").await;
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.get("j").await.unwrap().is_some());

        store.clear_expired().await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_sweeps_expired_entries() {
        let store = InMemorySessionStore::new();
        store.set("old", serde_json::json!(1), 300).await.unwrap();
        store.expire_now("old").await;
        store.set("new", serde_json::json!(2), 300).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemorySessionStore::new();
        store.set("k", serde_json::json!(1), 300).await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[test]
    fn test_session_ids_are_unique_hex() {
        let ids: HashSet<String> = (0..100).map(|_| new_session_id()).collect();
        assert_eq!(ids.len(), 100);
        for id in &ids {
            assert_eq!(id.len(), 64);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
