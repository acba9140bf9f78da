//! Per-identifier serialization of mutating operations
//!
//! The external utility has no notion of concurrent-caller safety, so
//! two mutations against the same device must never have overlapping
//! subprocess invocations. Each identifier gets its own async mutex;
//! permits are RAII so every exit path, including timeouts, releases
//! the guard.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held for the duration of one mutating operation on one identifier
pub type MutationPermit = OwnedMutexGuard<()>;

/// Table of per-identifier mutation locks
#[derive(Default)]
pub struct MutationGuard {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutation permit for `id`, waiting behind any
    /// in-flight mutation on the same identifier. Mutations on other
    /// identifiers are unaffected.
    pub async fn acquire(&self, id: &str) -> MutationPermit {
        let lock = {
            let mut table = self.locks.lock().await;
            // Entries whose mutex nobody holds or awaits are stale.
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(table.entry(id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of identifiers currently tracked
    #[cfg(test)]
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_identifier_serializes() {
        let guard = Arc::new(MutationGuard::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _permit = guard.acquire("rxd0").await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_identifiers_overlap() {
        let guard = Arc::new(MutationGuard::new());

        let a = guard.acquire("rxd0").await;
        // Must not deadlock: rxd1 is independent of the held rxd0 permit.
        let b = tokio::time::timeout(Duration::from_secs(1), guard.acquire("rxd1"))
            .await
            .expect("acquire on a different identifier blocked");
        drop(a);
        drop(b);
    }

    #[tokio::test]
    async fn dropped_permit_unblocks_next_acquirer() {
        let guard = Arc::new(MutationGuard::new());

        let permit = guard.acquire("rxd0").await;
        drop(permit);

        tokio::time::timeout(Duration::from_secs(1), guard.acquire("rxd0"))
            .await
            .expect("released identifier stayed blocked");
    }

    #[tokio::test]
    async fn stale_entries_are_pruned() {
        let guard = MutationGuard::new();

        drop(guard.acquire("rxd0").await);
        drop(guard.acquire("rxd1").await);
        // The next acquire prunes everything no longer referenced.
        let _permit = guard.acquire("rxd2").await;

        assert_eq!(guard.tracked().await, 1);
    }
}
