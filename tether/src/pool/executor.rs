//! Executor handle connections can be pinned to.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::runtime::Handle;

static ID_COUNTER: Lazy<Arc<AtomicU64>> = Lazy::new(|| Arc::new(AtomicU64::new(0)));
fn next_executor_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Runtime handle with an identity.
///
/// Two keys that should share connections must carry the same `Executor`
/// value (clones compare equal); wrapping the same runtime handle twice
/// produces two distinct executors.
#[derive(Debug, Clone)]
pub struct Executor {
    id: u64,
    handle: Handle,
}

impl Executor {
    /// Wrap a runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self {
            id: next_executor_id(),
            handle,
        }
    }

    /// Executor for the runtime the caller is running on.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// The underlying runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Unique executor identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Executor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Executor {}

impl Hash for Executor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
