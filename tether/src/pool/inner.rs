//! Per-key idle stacks.

use dashmap::DashMap;
use parking_lot::Mutex;

use super::{Error, PoolKey, Pooled};

/// Idle connections, partitioned by key.
///
/// Each key owns its own stack and lock; operations on different keys do
/// not contend. Stacks are created on first release for a key and kept for
/// the life of the pool.
pub(super) struct IdleStacks<C, K: PoolKey> {
    stacks: DashMap<K, Mutex<Vec<Pooled<C, K>>>>,
}

impl<C, K: PoolKey> IdleStacks<C, K> {
    pub(super) fn new() -> Self {
        Self {
            stacks: DashMap::new(),
        }
    }

    /// Take the most recently released connection for `key`, if any.
    pub(super) fn pop(&self, key: &K) -> Option<Pooled<C, K>> {
        let stack = self.stacks.get(key)?;
        let conn = stack.lock().pop();
        conn
    }

    /// Put a connection on `key`'s stack and run `released` while the stack
    /// is still locked, so no acquirer can observe the connection before
    /// the callback finishes.
    pub(super) fn push_with<F>(&self, key: K, conn: Pooled<C, K>, released: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let stack = self.stacks.entry(key).or_default();
        let mut guard = stack.lock();
        guard.push(conn);
        released()
    }

    /// Number of idle connections for `key`.
    pub(super) fn idle(&self, key: &K) -> usize {
        self.stacks.get(key).map(|s| s.lock().len()).unwrap_or(0)
    }

    /// Number of idle connections across all keys.
    pub(super) fn total(&self) -> usize {
        self.stacks.iter().map(|s| s.lock().len()).sum()
    }

    /// Remove and return every idle connection.
    pub(super) fn drain(&self) -> Vec<Pooled<C, K>> {
        let mut drained = Vec::new();
        for stack in self.stacks.iter() {
            drained.append(&mut *stack.lock());
        }
        drained
    }
}
