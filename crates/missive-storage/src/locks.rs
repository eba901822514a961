// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message mutual exclusion for conditional updates.
//!
//! Mutations of the same message are linearized; mutations of different
//! messages never wait on each other. Slots are created on demand and removed
//! once no holder or waiter references them, so the map only ever contains
//! messages with a mutation in flight.

use std::sync::Arc;

use dashmap::DashMap;
use missive_core::MessageId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-message locks.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<DashMap<MessageId, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Access ends when the guard drops.
    pub async fn lock(&self, key: MessageId) -> KeyGuard {
        let slot = Arc::clone(self.slots.entry(key).or_default().value());
        let guard = slot.lock_owned().await;
        KeyGuard {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Number of messages that currently have a holder or waiter.
    pub fn active(&self) -> usize {
        self.slots.len()
    }
}

/// Exclusive access to one message id.
pub struct KeyGuard {
    key: MessageId,
    slots: Arc<DashMap<MessageId, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone of the slot, so only an unreferenced slot goes.
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(MessageId(1)).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0, "slots are reclaimed after use");
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _first = locks.lock(MessageId(1)).await;

        let second = tokio::time::timeout(Duration::from_secs(1), locks.lock(MessageId(2))).await;
        assert!(second.is_ok(), "lock on another id must not wait");
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn slot_survives_while_a_waiter_exists() {
        let locks = KeyedLocks::new();
        let first = locks.lock(MessageId(7)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(MessageId(7)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(first);
        waiter.await.unwrap();

        assert_eq!(locks.active(), 0);
    }
}
