use crate::application_port::AuthError;
use crate::domain_port::RefreshStore;
use crate::logger::*;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-local refresh store.
///
/// Expiry is lazy: a stale entry is dropped the next time its key is touched.
/// `spawn_sweeper` additionally reclaims entries nobody asks for again.
#[derive(Default)]
pub struct InMemoryRefreshStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn spawn_sweeper(
        self: Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            debug!(removed, "swept expired refresh tokens");
                        }
                    }
                }
            }
            info!("refresh store sweeper stopped");
        })
    }
}

#[async_trait::async_trait]
impl RefreshStore for InMemoryRefreshStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // the read guard is released above; never hold it across a removal
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool, AuthError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| entry.is_live(now))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = InMemoryRefreshStore::new();
        store.set("r1", "f1", 60).await.unwrap();

        assert_eq!(store.get("r1").await.unwrap().as_deref(), Some("f1"));
        assert!(store.delete("r1").await.unwrap());
        assert_eq!(store.get("r1").await.unwrap(), None);
        assert!(!store.delete("r1").await.unwrap());
    }

    #[tokio::test]
    async fn last_set_wins() {
        let store = InMemoryRefreshStore::new();
        store.set("r1", "f1", 60).await.unwrap();
        store.set("r1", "f2", 60).await.unwrap();
        assert_eq!(store.get("r1").await.unwrap().as_deref(), Some("f2"));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = InMemoryRefreshStore::new();
        store.set("r1", "f1", 10).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("r1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("r1").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_an_expired_entry_reports_nothing_removed() {
        let store = InMemoryRefreshStore::new();
        store.set("r1", "f1", 1).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!store.delete("r1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_only_drops_expired_entries() {
        let store = InMemoryRefreshStore::new();
        store.set("short", "f1", 5).await.unwrap();
        store.set("long", "f2", 50).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_until_cancelled() {
        let store = Arc::new(InMemoryRefreshStore::new());
        store.set("r1", "f1", 1).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = store
            .clone()
            .spawn_sweeper(Duration::from_secs(5), cancel.clone());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
