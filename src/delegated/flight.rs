//! Per-identity refresh coordination.
//!
//! Refresh tokens are commonly single-use: if two concurrent requests for the
//! same identity both observe an expired credential and both call the
//! provider, the second call fails even though the identity is valid. The
//! guard map collapses those requests onto one upstream call — whoever holds
//! the guard refreshes, everyone queued behind it re-reads the record and
//! finds it fresh.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed mutual exclusion for refresh operations.
///
/// Guards are created on demand and pruned once uncontended, so the map only
/// ever holds entries for identities with an in-flight refresh.
#[derive(Default)]
pub struct FlightGuards {
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FlightGuards {
    /// Create an empty guard map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for `key`, waiting if another task holds it.
    ///
    /// The returned guard keeps its entry alive; dropping it releases the
    /// next waiter.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.guards.lock().await;
            // Entries nobody holds or waits on are dead weight
            guards.retain(|_, guard| Arc::strong_count(guard) > 1);
            guards
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        guard.lock_owned().await
    }

    /// Number of live entries, for tests.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.guards.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let guards = Arc::new(FlightGuards::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let guards = guards.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = guards.acquire("user-1").await;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_run_concurrently() {
        let guards = Arc::new(FlightGuards::new());

        let first = guards.acquire("user-1").await;
        // Must not deadlock while user-1 is held
        let _second = guards.acquire("user-2").await;
        drop(first);
    }

    #[tokio::test]
    async fn test_uncontended_entries_are_pruned() {
        let guards = FlightGuards::new();

        {
            let _guard = guards.acquire("user-1").await;
            assert_eq!(guards.len().await, 1);
        }

        // Next acquisition sweeps the released entry
        let _guard = guards.acquire("user-2").await;
        assert_eq!(guards.len().await, 1);
    }
}
