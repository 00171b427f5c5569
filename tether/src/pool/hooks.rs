//! Connection lifecycle hooks.

use crate::BoxError;

/// Callbacks fired at connection lifecycle transitions.
///
/// `on_created` runs once per new connection, before it is first handed to a
/// caller; `on_acquired` runs before a reused connection is handed out;
/// `on_released` runs after a connection has been put back on its idle
/// stack. For a given connection, `on_created` happens before `on_acquired`,
/// which happens before `on_released`, and acquire/release pairs alternate.
///
/// Hooks run inline on whatever task drove the transition (`on_released`
/// under the key's stack lock), so they must not block and must not call
/// back into the pool. An error from a hook fails the caller's operation.
pub trait Hooks<C, K>: Send + Sync {
    /// A new connection was established for `key`.
    fn on_created(&self, conn: &C, key: &K) -> Result<(), BoxError> {
        let _ = (conn, key);
        Ok(())
    }

    /// An idle connection was checked out for `key`.
    fn on_acquired(&self, conn: &C, key: &K) -> Result<(), BoxError> {
        let _ = (conn, key);
        Ok(())
    }

    /// A connection was checked back in under `key`.
    fn on_released(&self, conn: &C, key: &K) -> Result<(), BoxError> {
        let _ = (conn, key);
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl<C, K> Hooks<C, K> for NoopHooks {}
