//! Keyed connection pooling.

pub mod address;
pub mod bounded;
pub mod config;
pub mod conn;
pub mod connect;
pub mod error;
pub mod executor;
pub mod healthcheck;
pub mod hooks;
pub mod inner;
pub mod key;
pub mod simple;
pub mod waiting;

pub use address::Address;
pub use bounded::BoundedPool;
pub use config::Config;
pub use conn::{Connection, Pooled};
pub use connect::Connector;
pub use error::Error;
pub use executor::Executor;
pub use healthcheck::{ActiveHealthCheck, HealthCheck};
pub use hooks::{Hooks, NoopHooks};
pub use key::{ConnectKey, PoolKey};
pub use simple::SimplePool;

use futures::future::BoxFuture;

/// Acquire/release seam between the pool engine and its decorators.
///
/// Implemented by [`SimplePool`] and [`BoundedPool`]. A decorator owns an
/// inner pool through this trait rather than extending it.
pub trait Pool: Clone + Send + Sync + 'static {
    /// Connection type issued by the pool.
    type Conn: Connection;
    /// Key type the pool partitions connections by.
    type Key: PoolKey;

    /// Check a connection out of the pool, creating one if necessary.
    fn acquire(&self, key: Self::Key) -> BoxFuture<'static, Result<Pooled<Self::Conn, Self::Key>, Error>>;

    /// Check a connection back in. Resolves `true` iff the connection was
    /// issued by this pool and was re-pooled.
    fn release(&self, conn: Pooled<Self::Conn, Self::Key>) -> BoxFuture<'static, Result<bool, Error>>;

    /// Take the pool offline, closing idle connections.
    fn shutdown(&self) -> BoxFuture<'static, ()>;
}
