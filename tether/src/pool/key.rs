//! Pool keys.

use std::fmt::Debug;
use std::hash::Hash;

use super::{Address, Executor};

/// Identity connections are partitioned by.
///
/// Equality and hash define the cache partitions: two connections with equal
/// keys are interchangeable from the pool's perspective. Keys are cloned on
/// every checkout, so keep them cheap.
pub trait PoolKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Remote endpoint connections for this key dial.
    fn remote_address(&self) -> &Address;

    /// Executor new connections for this key are driven on, if pinned.
    fn executor(&self) -> Option<&Executor> {
        None
    }
}

/// Default pool key: an address, optionally pinned to an executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectKey {
    address: Address,
    executor: Option<Executor>,
}

impl ConnectKey {
    /// Key for an address, connections driven on the caller's runtime.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            executor: None,
        }
    }

    /// Key for an address with connections pinned to an executor.
    pub fn with_executor(address: Address, executor: Executor) -> Self {
        Self {
            address,
            executor: Some(executor),
        }
    }
}

impl PoolKey for ConnectKey {
    fn remote_address(&self) -> &Address {
        &self.address
    }

    fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }
}
