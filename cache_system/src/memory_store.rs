//! In-process response store
//!
//! A map with per-key deadlines. Useful for single-process deployments
//! and for exercising the cache without a Redis server. Every operation
//! is recorded so callers can assert on the exact sequence issued.

use crate::errors::CacheError;
use crate::store::ResponseStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One store call, as issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    Set(String),
    Expire(String, u64),
    Auth,
    Ping,
}

/// Operation kind, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOpKind {
    Get,
    Set,
    Expire,
    Auth,
    Ping,
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    ops: Vec<StoreOp>,
    failing: HashSet<StoreOpKind>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(
        &self,
        kind: StoreOpKind,
        op: StoreOp,
        f: impl FnOnce(&mut Inner) -> R,
    ) -> Result<R, CacheError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CacheError::General("memory store lock poisoned".into()))?;
        inner.ops.push(op);

        if inner.failing.contains(&kind) {
            return Err(CacheError::Connection(format!(
                "injected {:?} failure",
                kind
            )));
        }
        Ok(f(&mut inner))
    }

    /// Make every subsequent operation of `kind` fail with a connection error
    pub fn fail_on(&self, kind: StoreOpKind) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing.insert(kind);
        }
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing.clear();
        }
    }

    /// Every operation issued so far, oldest first
    pub fn ops(&self) -> Vec<StoreOp> {
        self.inner
            .lock()
            .map(|inner| inner.ops.clone())
            .unwrap_or_default()
    }

    /// Seconds left before `key` expires; `None` if missing or without expiry
    pub fn ttl(&self, key: &str) -> Option<u64> {
        let inner = self.inner.lock().ok()?;
        let now = Instant::now();
        let entry = inner.entries.get(key).filter(|e| e.is_live(now))?;
        entry
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(now).as_secs_f64().round() as u64)
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .inner
            .lock()
            .map(|inner| {
                inner
                    .entries
                    .iter()
                    .filter(|(_, e)| e.is_live(now))
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.with_inner(StoreOpKind::Get, StoreOp::Get(key.to_string()), |inner| {
            let now = Instant::now();
            match inner.entries.get(key) {
                Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
                Some(_) => {
                    inner.entries.remove(key);
                    None
                }
                None => None,
            }
        })
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.with_inner(StoreOpKind::Set, StoreOp::Set(key.to_string()), |inner| {
            // SET clears any previous expiry, as Redis does
            inner.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_vec(),
                    expires_at: None,
                },
            );
        })
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<(), CacheError> {
        self.with_inner(
            StoreOpKind::Expire,
            StoreOp::Expire(key.to_string(), ttl),
            |inner| {
                if ttl == 0 {
                    inner.entries.remove(key);
                } else if let Some(entry) = inner.entries.get_mut(key) {
                    entry.expires_at = Instant::now().checked_add(Duration::from_secs(ttl));
                }
            },
        )
    }

    async fn auth(&self, _secret: &str) -> Result<(), CacheError> {
        self.with_inner(StoreOpKind::Auth, StoreOp::Auth, |_| ())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.with_inner(StoreOpKind::Ping, StoreOp::Ping, |_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_expire() {
        let store = MemoryStore::new();

        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", b"value").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.ttl("a"), None);

        store.expire("a", 120).await.unwrap();
        assert_eq!(store.ttl("a"), Some(120));

        // A fresh SET drops the expiry
        store.set("a", b"other").await.unwrap();
        assert_eq!(store.ttl("a"), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_deletes() {
        let store = MemoryStore::new();
        store.set("a", b"value").await.unwrap();
        store.expire("a", 0).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_expire_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.expire("missing", 10).await.unwrap();
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let store = MemoryStore::new();
        store.fail_on(StoreOpKind::Set);

        let err = store.set("a", b"v").await.unwrap_err();
        assert!(matches!(err, CacheError::Connection(_)));
        assert_eq!(store.ops(), vec![StoreOp::Set("a".to_string())]);
        assert!(store.keys().is_empty());

        store.heal();
        store.set("a", b"v").await.unwrap();
        assert_eq!(store.keys(), vec!["a".to_string()]);
    }
}
