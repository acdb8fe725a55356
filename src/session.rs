//! Per-tab view state kept between page requests.
//!
//! Each rendered page carries a session id in its links. A request that only
//! changes presentation (mode, rating filter, expanded buckets or episodes)
//! picks the stored view back up and re-renders it without going to the
//! backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const MAX_SESSIONS: usize = 1024;

pub struct SessionStore<T> {
    entries: Mutex<HashMap<u64, (T, Instant)>>,
    next_id: AtomicU64,
    ttl: Duration,
    capacity: usize,
}

impl<T> SessionStore<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            ttl,
            capacity,
        }
    }

    /// Hands out an id that has never been used by this store.
    pub fn issue(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Removes and returns the state stored under `id`, unless it has expired.
    /// The caller puts it back once the request is done with it.
    pub async fn take(&self, id: u64) -> Option<T> {
        let mut guard = self.entries.lock().await;
        let (value, touched) = guard.remove(&id)?;
        if touched.elapsed() > self.ttl {
            debug!("Session {} expired", id);
            return None;
        }
        Some(value)
    }

    pub async fn put(&self, id: u64, value: T) {
        let now = Instant::now();
        let mut guard = self.entries.lock().await;
        guard.retain(|_, (_, touched)| now.duration_since(*touched) <= self.ttl);
        if guard.len() >= self.capacity {
            debug!("Session store full ({} entries), clearing", guard.len());
            guard.clear();
        }
        guard.insert(id, (value, now));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_removes_the_entry() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        let id = store.issue();
        store.put(id, "view").await;
        assert_eq!(store.take(id).await, Some("view"));
        assert_eq!(store.take(id).await, None);
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let store: SessionStore<()> = SessionStore::new(Duration::from_secs(60), 8);
        let first = store.issue();
        let second = store.issue();
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_dropped() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        let stale = store.issue();
        store.put(stale, 1).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.take(stale).await, None);

        let old = store.issue();
        store.put(old, 2).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = store.issue();
        store.put(fresh, 3).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn full_store_starts_over() {
        let store = SessionStore::new(Duration::from_secs(60), 2);
        for value in 0..2 {
            store.put(store.issue(), value).await;
        }
        let id = store.issue();
        store.put(id, 9).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.take(id).await, Some(9));
    }
}
