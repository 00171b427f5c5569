//! Healthcheck a connection.

use futures::future::{self, BoxFuture, FutureExt};

use super::Connection;

/// Decides whether a previously idle connection may be handed out again.
///
/// The verdict may resolve immediately or asynchronously. Probing must not
/// leave the connection in a state that prevents its reuse. A `false`
/// verdict causes the pool to close the connection and try the next idle
/// candidate; it is never surfaced to the caller.
pub trait HealthCheck<C, K>: Send + Sync {
    /// Verdict on whether `conn` can still serve requests under `key`.
    fn check<'a>(&'a self, conn: &'a C, key: &'a K) -> BoxFuture<'a, bool>;
}

/// Health check that trusts the connection's own liveness flag.
///
/// The default for pools built without an explicit checker. Zero-sized;
/// share one value across pools.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveHealthCheck;

impl<C: Connection, K> HealthCheck<C, K> for ActiveHealthCheck {
    fn check<'a>(&'a self, conn: &'a C, _key: &'a K) -> BoxFuture<'a, bool> {
        future::ready(conn.is_active()).boxed()
    }
}
