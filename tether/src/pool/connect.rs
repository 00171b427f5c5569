//! Connection factory.

use futures::future::BoxFuture;

use super::{Connection, PoolKey};
use crate::BoxError;

/// Dials new connections for the pool.
///
/// The pool calls `connect` once per cache miss, with the key the caller
/// asked for; the factory reads the remote endpoint off the key. When the
/// key pins an executor, the pool drives the returned future on that
/// executor's runtime.
pub trait Connector: Send + Sync + 'static {
    /// Key type connections are requested under.
    type Key: PoolKey;
    /// Connection type produced.
    type Conn: Connection;

    /// Establish a new connection to the key's remote address.
    fn connect(&self, key: &Self::Key) -> BoxFuture<'static, Result<Self::Conn, BoxError>>;
}
